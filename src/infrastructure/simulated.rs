use crate::domain::gateway::{
    AuthorizationRequest, AuthorizationResponse, AuthorizationTokens, ConfirmationRequest,
    ConfirmationResponse,
};
use crate::domain::ports::{Connector, GatewayClient, ReceiptFetcher, Transport};
use crate::domain::receipt::ReceiptRequest;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

#[derive(Default)]
struct Script {
    authorizations: VecDeque<AuthorizationResponse>,
    confirmations: VecDeque<ConfirmationResponse>,
    failures: VecDeque<String>,
    authorization_requests: Vec<AuthorizationRequest>,
    confirmation_requests: Vec<ConfirmationRequest>,
    receipt_requests: Vec<ReceiptRequest>,
    issued: u32,
}

/// An in-process gateway that answers from a script.
///
/// Queued responses are served in order; once a queue is empty every call is
/// approved with generated tokens. All requests are recorded so tests can
/// inspect what would have gone over the wire. Clones share the same script.
#[derive(Default, Clone)]
pub struct SimulatedGateway {
    script: Arc<Mutex<Script>>,
    connections: Arc<AtomicUsize>,
    open_handles: Arc<AtomicUsize>,
}

impl SimulatedGateway {
    /// Creates a new gateway that approves everything.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connector(&self) -> SimulatedConnector {
        SimulatedConnector {
            gateway: self.clone(),
        }
    }

    pub async fn push_authorization(&self, response: AuthorizationResponse) {
        self.script.lock().await.authorizations.push_back(response);
    }

    pub async fn push_confirmation(&self, response: ConfirmationResponse) {
        self.script.lock().await.confirmations.push_back(response);
    }

    /// Makes the next gateway call fail with a transport error.
    pub async fn fail_next_call(&self, reason: impl Into<String>) {
        self.script.lock().await.failures.push_back(reason.into());
    }

    pub async fn authorization_requests(&self) -> Vec<AuthorizationRequest> {
        self.script.lock().await.authorization_requests.clone()
    }

    pub async fn confirmation_requests(&self) -> Vec<ConfirmationRequest> {
        self.script.lock().await.confirmation_requests.clone()
    }

    pub async fn receipt_requests(&self) -> Vec<ReceiptRequest> {
        self.script.lock().await.receipt_requests.clone()
    }

    /// Number of transports handed out so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Number of transports not yet dropped.
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }

    fn approval(sequence: u32, order_id: &str) -> AuthorizationResponse {
        AuthorizationResponse {
            code: Some(0),
            message: Some("Transacao+aprovada".to_string()),
            tokens: AuthorizationTokens {
                order_number: order_id.to_string(),
                date: "20240101".to_string(),
                authorization_number: format!("{sequence:06}"),
                voucher_number: format!("{:09}", 100_000 + sequence),
                authentication_number: format!("{:06}", 500_000 + sequence),
                sequence_number: sequence.to_string(),
                bin_origin: "N".to_string(),
            },
        }
    }
}

#[async_trait]
impl GatewayClient for SimulatedGateway {
    async fn get_authorized(
        &self,
        request: &AuthorizationRequest,
    ) -> Result<AuthorizationResponse> {
        let mut script = self.script.lock().await;
        if let Some(reason) = script.failures.pop_front() {
            return Err(PaymentError::transport(reason));
        }
        script.authorization_requests.push(request.clone());
        script.issued += 1;
        let sequence = script.issued;
        Ok(script
            .authorizations
            .pop_front()
            .unwrap_or_else(|| Self::approval(sequence, &request.order_id)))
    }

    async fn confirm_txn(&self, request: &ConfirmationRequest) -> Result<ConfirmationResponse> {
        let mut script = self.script.lock().await;
        if let Some(reason) = script.failures.pop_front() {
            return Err(PaymentError::transport(reason));
        }
        script.confirmation_requests.push(request.clone());
        Ok(script
            .confirmations
            .pop_front()
            .unwrap_or(ConfirmationResponse {
                code: 0,
                message: None,
            }))
    }
}

#[async_trait]
impl ReceiptFetcher for SimulatedGateway {
    async fn fetch(&self, request: &ReceiptRequest) -> Result<Vec<u8>> {
        let mut script = self.script.lock().await;
        script.receipt_requests.push(request.clone());
        let rows: String = request
            .fields()
            .iter()
            .map(|(name, value)| format!("<tr><td>{name}</td><td>{value}</td></tr>"))
            .collect();
        Ok(format!("<html><body><table>{rows}</table></body></html>").into_bytes())
    }
}

/// Hands out transports backed by a shared [`SimulatedGateway`].
#[derive(Clone)]
pub struct SimulatedConnector {
    gateway: SimulatedGateway,
}

impl Connector for SimulatedConnector {
    fn connect(&self) -> Result<Transport> {
        self.gateway.connections.fetch_add(1, Ordering::SeqCst);
        self.gateway.open_handles.fetch_add(1, Ordering::SeqCst);
        Ok(Transport {
            gateway: Box::new(TrackedGateway {
                inner: self.gateway.clone(),
            }),
            receipts: Box::new(self.gateway.clone()),
        })
    }
}

/// Gateway handle that reports its release back to the simulator.
struct TrackedGateway {
    inner: SimulatedGateway,
}

impl Drop for TrackedGateway {
    fn drop(&mut self) {
        self.inner.open_handles.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl GatewayClient for TrackedGateway {
    async fn get_authorized(
        &self,
        request: &AuthorizationRequest,
    ) -> Result<AuthorizationResponse> {
        self.inner.get_authorized(request).await
    }

    async fn confirm_txn(&self, request: &ConfirmationRequest) -> Result<ConfirmationResponse> {
        self.inner.confirm_txn(request).await
    }
}
