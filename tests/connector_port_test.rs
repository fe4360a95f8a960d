use komerci::domain::attempt::{AttemptStatus, PaymentAttempt};
use komerci::domain::card::{CardDetails, CardNumber};
use komerci::domain::gateway::{AuthorizationExtras, ConfirmationExtras};
use komerci::domain::order::PaymentOrder;
use komerci::domain::ports::{Connector, ConnectorBox};
use komerci::infrastructure::simulated::SimulatedGateway;
use rust_decimal_macros::dec;

fn order(order_id: &str) -> PaymentOrder {
    PaymentOrder {
        affiliation_id: "1234567".to_string(),
        total: dec!(25.00),
        installments: 1,
        order_id: order_id.to_string(),
        card: CardDetails {
            number: CardNumber::new("5500000000000004"),
            cvc2: "321".to_string(),
            exp_month: "12".to_string(),
            exp_year: "2031".to_string(),
            holder_name: "MARIA SILVA".to_string(),
        },
        category: None,
    }
}

#[tokio::test]
async fn test_connector_as_trait_object() {
    let gateway = SimulatedGateway::new();
    let connector: ConnectorBox = Box::new(gateway.connector());

    let transport = connector.connect().unwrap();
    assert_eq!(gateway.open_handles(), 1);
    drop(transport);
    assert_eq!(gateway.open_handles(), 0);
}

#[tokio::test]
async fn test_attempts_in_tasks() {
    let gateway = SimulatedGateway::new();
    let connector: ConnectorBox = Box::new(gateway.connector());

    // Verify Send + Sync by spawning tasks
    let mut attempts = Vec::new();
    for i in 0..4 {
        let mut attempt = PaymentAttempt::new(order(&format!("order-{i}")), connector.as_ref()).unwrap();
        attempts.push(tokio::spawn(async move {
            attempt.authorize(AuthorizationExtras::default()).await.unwrap();
            attempt.capture(ConfirmationExtras::default()).await.unwrap();
            attempt.status()
        }));
    }

    for handle in attempts {
        assert_eq!(handle.await.unwrap(), AttemptStatus::Captured);
    }
    assert_eq!(gateway.connections(), 4);
    assert_eq!(gateway.open_handles(), 0);
    assert_eq!(gateway.authorization_requests().await.len(), 4);
}
