use crate::domain::attempt::{AttemptStatus, PaymentAttempt};
use crate::domain::card::CardNumber;
use crate::domain::gateway::{AuthorizationExtras, ConfirmationExtras};
use crate::domain::order::{OrderRecord, PaymentOrder};
use crate::domain::ports::ConnectorBox;
use crate::error::{PaymentError, Result};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    /// The order never reached the gateway.
    Rejected,
    Created,
    Authorized,
    Captured,
}

impl From<AttemptStatus> for ReportStatus {
    fn from(status: AttemptStatus) -> Self {
        match status {
            AttemptStatus::Created => Self::Created,
            AttemptStatus::Authorized => Self::Authorized,
            AttemptStatus::Captured => Self::Captured,
        }
    }
}

/// What happened to one order, ready to be written out.
#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
pub struct CheckoutReport {
    pub order_id: String,
    pub status: ReportStatus,
    /// Return code of the last gateway answer, when there was one.
    pub code: Option<i32>,
    pub message: String,
    /// Always masked.
    pub card: String,
    pub authorization_number: String,
    /// Path of the saved receipt, empty when none was written.
    pub receipt: String,
}

impl CheckoutReport {
    fn rejected(order_id: String, card: String, err: &PaymentError) -> Self {
        Self {
            order_id,
            status: ReportStatus::Rejected,
            code: None,
            message: err.to_string(),
            card,
            authorization_number: String::new(),
            receipt: String::new(),
        }
    }

    fn from_attempt(attempt: &PaymentAttempt, err: Option<&PaymentError>) -> Self {
        let authorization = attempt.authorization();
        let (code, message) = match (err, attempt.confirmation()) {
            (Some(PaymentError::AuthorizationDeclined { code, message }), _)
            | (Some(PaymentError::ConfirmationDeclined { code, message }), _) => {
                (Some(*code), message.clone())
            }
            (Some(err), _) => (None, err.to_string()),
            (None, Some(confirmation)) if !confirmation.message().is_empty() => {
                (Some(confirmation.code()), confirmation.message().to_string())
            }
            (None, Some(confirmation)) => (
                Some(confirmation.code()),
                authorization.map(|a| a.message.clone()).unwrap_or_default(),
            ),
            (None, None) => (
                authorization.map(|_| 0),
                authorization.map(|a| a.message.clone()).unwrap_or_default(),
            ),
        };

        Self {
            order_id: attempt.order_id().to_string(),
            status: attempt.status().into(),
            code,
            message,
            card: attempt.masked_card_number().to_string(),
            authorization_number: authorization
                .map(|a| a.tokens.authorization_number.clone())
                .unwrap_or_default(),
            receipt: String::new(),
        }
    }
}

/// Drives payment orders through authorize, capture and receipt retrieval.
///
/// Orders are handled one at a time and nothing is retried: every failure
/// ends the order and is reported as-is.
pub struct CheckoutService {
    connector: ConnectorBox,
    receipts_dir: Option<PathBuf>,
}

impl CheckoutService {
    /// Creates a new `CheckoutService` that opens transports through `connector`.
    pub fn new(connector: ConnectorBox) -> Self {
        Self {
            connector,
            receipts_dir: None,
        }
    }

    /// Saves the receipt of every captured payment into `dir`.
    pub fn with_receipts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.receipts_dir = Some(dir.into());
        self
    }

    /// Resolves the symbolic category of a batch record, then processes it.
    pub async fn process_record(&self, record: OrderRecord) -> CheckoutReport {
        let order_id = record.order_id.clone();
        let card = CardNumber::new(record.card_number.as_str()).mask().to_string();
        match PaymentOrder::try_from(record) {
            Ok(order) => self.process(order).await,
            Err(e) => {
                warn!(order_id = %order_id, error = %e, "Order rejected");
                CheckoutReport::rejected(order_id, card, &e)
            }
        }
    }

    pub async fn process(&self, order: PaymentOrder) -> CheckoutReport {
        let order_id = order.order_id.clone();
        let card = order.card.number.mask().to_string();

        let mut attempt = match PaymentAttempt::new(order, self.connector.as_ref()) {
            Ok(attempt) => attempt,
            Err(e) => {
                warn!(order_id = %order_id, error = %e, "Order rejected");
                return CheckoutReport::rejected(order_id, card, &e);
            }
        };

        if let Err(e) = attempt.authorize(AuthorizationExtras::default()).await {
            return CheckoutReport::from_attempt(&attempt, Some(&e));
        }
        if let Err(e) = attempt.capture(ConfirmationExtras::default()).await {
            return CheckoutReport::from_attempt(&attempt, Some(&e));
        }

        let mut report = CheckoutReport::from_attempt(&attempt, None);
        if let Some(dir) = &self.receipts_dir {
            match self.save_receipt(&attempt, dir).await {
                Ok(path) => report.receipt = path.display().to_string(),
                Err(e) => warn!(order_id = %order_id, error = %e, "Receipt not saved"),
            }
        }

        info!(order_id = %order_id, status = ?report.status, "Order processed");
        report
    }

    async fn save_receipt(&self, attempt: &PaymentAttempt, dir: &Path) -> Result<PathBuf> {
        let body = attempt.fetch_receipt().await?;
        let stem = receipt_file_stem(attempt.order_id());
        let (path, mut file) = create_receipt_file(dir, &stem).await?;
        file.write_all(&body).await?;
        file.flush().await?;
        Ok(path)
    }
}

/// Creates `<stem>.html`, or `<stem>-<n>.html` when earlier receipts already
/// took the name. Existing files are never overwritten.
async fn create_receipt_file(dir: &Path, stem: &str) -> Result<(PathBuf, File)> {
    let mut copy = 1u32;
    loop {
        let name = if copy == 1 {
            format!("{stem}.html")
        } else {
            format!("{stem}-{copy}.html")
        };
        let path = dir.join(name);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => copy += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Keeps order ids from escaping the receipts directory.
fn receipt_file_stem(order_id: &str) -> String {
    order_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
