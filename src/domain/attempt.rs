use super::card::{CardData, MaskedCardNumber, RedactedCard};
use super::category::TransactionCategory;
use super::gateway::{
    Authorization, AuthorizationExtras, AuthorizationOutcome, AuthorizationRequest,
    AuthorizationTokens, ConfirmationExtras, ConfirmationOutcome, ConfirmationRequest, DEFER_CONFIRMATION,
};
use super::installments::Installments;
use super::money::{Amount, AmountFormatter, FixedPointFormatter, FormattedAmount};
use super::order::PaymentOrder;
use super::ports::{Connector, Transport};
use super::receipt::ReceiptRequest;
use crate::error::{PaymentError, Result};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    Created,
    Authorized,
    Captured,
}

/// Lifecycle of a payment attempt. Gateway tokens only exist once the
/// authorization has been approved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptState {
    Created,
    Authorized(Authorization),
    Captured {
        authorization: Authorization,
        confirmation: ConfirmationOutcome,
    },
}

impl AttemptState {
    pub fn status(&self) -> AttemptStatus {
        match self {
            AttemptState::Created => AttemptStatus::Created,
            AttemptState::Authorized(_) => AttemptStatus::Authorized,
            AttemptState::Captured { .. } => AttemptStatus::Captured,
        }
    }
}

/// A single card payment against the gateway: authorize, then capture.
///
/// Inputs are validated and normalized once, on construction, before any
/// transport is acquired. The attempt owns its [`Transport`] and releases it
/// when dropped. Transitions take `&mut self`; callers sharing an attempt
/// must serialize access themselves.
pub struct PaymentAttempt {
    affiliation_id: String,
    category: TransactionCategory,
    total: FormattedAmount,
    installments: Installments,
    order_id: String,
    card: CardData,
    state: AttemptState,
    declined_tokens: Option<AuthorizationTokens>,
    transport: Transport,
}

impl PaymentAttempt {
    /// Opens an attempt using the default two-place amount formatting.
    pub fn new(order: PaymentOrder, connector: &dyn Connector) -> Result<Self> {
        Self::with_formatter(order, connector, &FixedPointFormatter::default())
    }

    pub fn with_formatter(
        order: PaymentOrder,
        connector: &dyn Connector,
        formatter: &dyn AmountFormatter,
    ) -> Result<Self> {
        let installments = Installments::validate(order.installments, order.category)?;
        let category = installments.category_for(order.category);
        let total = formatter.format(Amount::new(order.total)?);

        let transport = connector.connect()?;
        debug!(
            order_id = %order.order_id,
            total = %total,
            installments = %installments.code(),
            category = category.code(),
            "Payment attempt created"
        );

        Ok(Self {
            affiliation_id: order.affiliation_id,
            category,
            total,
            installments,
            order_id: order.order_id,
            card: CardData::Full(order.card),
            state: AttemptState::Created,
            declined_tokens: None,
            transport,
        })
    }

    /// Asks the gateway to authorize the payment and reserve the funds.
    ///
    /// The card number is redacted as soon as the gateway answers, whatever
    /// the answer. A declined authorization leaves the attempt in `Created`
    /// but with a redacted card, so it cannot be authorized again. The tokens
    /// the gateway issued with the decline stay available through
    /// [`PaymentAttempt::declined_tokens`].
    pub async fn authorize(&mut self, extras: AuthorizationExtras) -> Result<Authorization> {
        if !matches!(self.state, AttemptState::Created) {
            return Err(PaymentError::PreconditionViolated(format!(
                "authorize is only allowed once, attempt is {:?}",
                self.state.status()
            )));
        }
        let Some(card) = self.card.full() else {
            return Err(PaymentError::PreconditionViolated(
                "card data was redacted by a previous authorization".to_string(),
            ));
        };

        let request = AuthorizationRequest {
            total: self.total.to_string(),
            category_code: self.category.code(),
            installments_code: self.installments.code(),
            affiliation_id: self.affiliation_id.clone(),
            order_id: self.order_id.clone(),
            card_number: card.number.expose().to_string(),
            cvc2: card.cvc2.clone(),
            exp_month: card.exp_month.clone(),
            exp_year: card.exp_year.clone(),
            card_holder_name: card.holder_name.clone(),
            auto_confirm: DEFER_CONFIRMATION,
            extras,
        };

        let response = self.transport.gateway.get_authorized(&request).await?;
        drop(request);
        self.card.redact();

        match AuthorizationOutcome::classify(response) {
            AuthorizationOutcome::Approved(authorization) => {
                info!(
                    order_id = %self.order_id,
                    card = %self.card.masked_number(),
                    authorization_number = %authorization.tokens.authorization_number,
                    "Payment authorized"
                );
                self.state = AttemptState::Authorized(authorization.clone());
                Ok(authorization)
            }
            AuthorizationOutcome::Declined {
                code,
                message,
                tokens,
            } => {
                warn!(
                    order_id = %self.order_id,
                    code,
                    message = %message,
                    gateway_order = %tokens.order_number,
                    gateway_date = %tokens.date,
                    "Authorization declined"
                );
                self.declined_tokens = Some(tokens);
                Err(PaymentError::AuthorizationDeclined { code, message })
            }
        }
    }

    /// Confirms a previously authorized payment.
    ///
    /// A declined confirmation leaves the attempt `Authorized`; the funds may
    /// be in an indeterminate state at the gateway and reconciling them is up
    /// to the caller.
    pub async fn capture(&mut self, extras: ConfirmationExtras) -> Result<ConfirmationOutcome> {
        let authorization = match &self.state {
            AttemptState::Authorized(authorization) => authorization.clone(),
            AttemptState::Created => {
                return Err(PaymentError::PreconditionViolated(
                    "authorize must precede capture".to_string(),
                ));
            }
            AttemptState::Captured { .. } => {
                return Err(PaymentError::PreconditionViolated(
                    "payment was already captured".to_string(),
                ));
            }
        };

        let tokens = &authorization.tokens;
        let request = ConfirmationRequest {
            date: tokens.date.clone(),
            sequence_number: tokens.sequence_number.clone(),
            voucher_number: tokens.voucher_number.clone(),
            authorization_number: tokens.authorization_number.clone(),
            installments_code: self.installments.code(),
            category_code: self.category.code(),
            total: self.total.to_string(),
            affiliation_id: self.affiliation_id.clone(),
            distributor: String::new(),
            order_id: self.order_id.clone(),
            first_document: self.order_id.clone(),
            extras,
        };

        let response = self.transport.gateway.confirm_txn(&request).await?;
        let confirmation = ConfirmationOutcome::classify(response);

        if let ConfirmationOutcome::Declined { code, message } = &confirmation {
            warn!(
                order_id = %self.order_id,
                code = *code,
                message = %message,
                "Confirmation declined"
            );
            return Err(PaymentError::ConfirmationDeclined {
                code: *code,
                message: message.clone(),
            });
        }

        info!(
            order_id = %self.order_id,
            code = confirmation.code(),
            "Payment captured"
        );
        self.state = AttemptState::Captured {
            authorization,
            confirmation: confirmation.clone(),
        };
        Ok(confirmation)
    }

    /// Form fields for the receipt page. Only available after capture.
    pub fn receipt_request(&self) -> Result<ReceiptRequest> {
        match &self.state {
            AttemptState::Captured { authorization, .. } => Ok(ReceiptRequest::new(
                &authorization.tokens,
                &self.affiliation_id,
            )),
            other => Err(PaymentError::PreconditionViolated(format!(
                "receipt requires a captured payment, attempt is {:?}",
                other.status()
            ))),
        }
    }

    /// Downloads the rendered receipt for a captured payment.
    pub async fn fetch_receipt(&self) -> Result<Vec<u8>> {
        let request = self.receipt_request()?;
        self.transport.receipts.fetch(&request).await
    }

    pub fn status(&self) -> AttemptStatus {
        self.state.status()
    }

    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    pub fn authorization(&self) -> Option<&Authorization> {
        match &self.state {
            AttemptState::Created => None,
            AttemptState::Authorized(authorization)
            | AttemptState::Captured { authorization, .. } => Some(authorization),
        }
    }

    /// Gateway tokens returned with a declined authorization, kept so the
    /// decline can be reconciled (`NUMPEDIDO`, `DATA`).
    pub fn declined_tokens(&self) -> Option<&AuthorizationTokens> {
        self.declined_tokens.as_ref()
    }

    pub fn confirmation(&self) -> Option<&ConfirmationOutcome> {
        match &self.state {
            AttemptState::Captured { confirmation, .. } => Some(confirmation),
            _ => None,
        }
    }

    pub fn affiliation_id(&self) -> &str {
        &self.affiliation_id
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn category(&self) -> TransactionCategory {
        self.category
    }

    pub fn total(&self) -> &FormattedAmount {
        &self.total
    }

    pub fn installments(&self) -> Installments {
        self.installments
    }

    /// Card data left after the gateway answered an authorization request.
    pub fn redacted_card(&self) -> Option<&RedactedCard> {
        self.card.redacted()
    }

    pub fn masked_card_number(&self) -> MaskedCardNumber {
        self.card.masked_number()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::card::{CardDetails, CardNumber};
    use crate::domain::gateway::{AuthorizationResponse, AuthorizationTokens, ConfirmationResponse};
    use crate::infrastructure::simulated::SimulatedGateway;
    use rust_decimal_macros::dec;

    fn order(installments: u32, category: Option<TransactionCategory>) -> PaymentOrder {
        PaymentOrder {
            affiliation_id: "1234567".to_string(),
            total: dec!(150.5),
            installments,
            order_id: "order-1".to_string(),
            card: CardDetails {
                number: CardNumber::new("4111111111111111"),
                cvc2: "123".to_string(),
                exp_month: "05".to_string(),
                exp_year: "2030".to_string(),
                holder_name: "JOHN DOE".to_string(),
            },
            category,
        }
    }

    fn approval() -> AuthorizationResponse {
        AuthorizationResponse {
            code: Some(0),
            message: Some("Aprovado".to_string()),
            tokens: AuthorizationTokens {
                order_number: "order-1".to_string(),
                date: "20240115".to_string(),
                authorization_number: "123456".to_string(),
                voucher_number: "987654".to_string(),
                authentication_number: "555".to_string(),
                sequence_number: "42".to_string(),
                bin_origin: "N".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_construction_normalizes_fields() {
        let gateway = SimulatedGateway::new();
        let attempt = PaymentAttempt::new(order(1, None), &gateway.connector()).unwrap();

        assert_eq!(attempt.status(), AttemptStatus::Created);
        assert_eq!(attempt.total().as_str(), "150.50");
        assert_eq!(attempt.installments().code(), "00");
        assert_eq!(attempt.category(), TransactionCategory::Cash);
        assert!(attempt.authorization().is_none());
    }

    #[tokio::test]
    async fn test_authorize_then_capture() {
        let gateway = SimulatedGateway::new();
        gateway.push_authorization(approval()).await;
        gateway
            .push_confirmation(ConfirmationResponse {
                code: 0,
                message: None,
            })
            .await;

        let mut attempt = PaymentAttempt::new(
            order(3, Some(TransactionCategory::Customer)),
            &gateway.connector(),
        )
        .unwrap();

        let authorization = attempt.authorize(AuthorizationExtras::default()).await.unwrap();
        assert_eq!(authorization.tokens.authorization_number, "123456");
        assert_eq!(attempt.status(), AttemptStatus::Authorized);
        assert_eq!(
            attempt.redacted_card().unwrap().number.as_str(),
            "************1111"
        );
        assert!(attempt.declined_tokens().is_none());

        attempt.capture(ConfirmationExtras::default()).await.unwrap();
        assert_eq!(attempt.status(), AttemptStatus::Captured);

        let sent = gateway.authorization_requests().await;
        assert_eq!(sent[0].installments_code, "03");
        assert_eq!(sent[0].category_code, "06");
        assert_eq!(sent[0].total, "150.50");
        assert_eq!(sent[0].auto_confirm, "N");
    }

    #[tokio::test]
    async fn test_capture_requires_authorization() {
        let gateway = SimulatedGateway::new();
        let mut attempt = PaymentAttempt::new(order(1, None), &gateway.connector()).unwrap();

        let result = attempt.capture(ConfirmationExtras::default()).await;
        assert!(matches!(result, Err(PaymentError::PreconditionViolated(_))));
        assert!(gateway.confirmation_requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_card() {
        let gateway = SimulatedGateway::new();
        gateway.fail_next_call("connection reset").await;

        let mut attempt = PaymentAttempt::new(order(1, None), &gateway.connector()).unwrap();
        let result = attempt.authorize(AuthorizationExtras::default()).await;

        assert!(matches!(result, Err(PaymentError::Transport(_))));
        assert_eq!(attempt.status(), AttemptStatus::Created);
        assert!(attempt.redacted_card().is_none());
    }
}
