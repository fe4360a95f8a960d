use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Unknown transaction category: {0:?}")]
    UnknownCategory(String),
    #[error("Authorization declined ({code}): {message}")]
    AuthorizationDeclined { code: i32, message: String },
    #[error("Confirmation declined ({code}): {message}")]
    ConfirmationDeclined { code: i32, message: String },
    #[error("Precondition violated: {0}")]
    PreconditionViolated(String),
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PaymentError {
    /// Wraps any transport-level failure without translating it.
    pub fn transport<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Transport(err.into())
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;
