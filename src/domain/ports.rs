use super::gateway::{
    AuthorizationRequest, AuthorizationResponse, ConfirmationRequest, ConfirmationResponse,
};
use super::receipt::ReceiptRequest;
use crate::error::Result;
use async_trait::async_trait;

/// Remote authorization gateway.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    async fn get_authorized(&self, request: &AuthorizationRequest)
    -> Result<AuthorizationResponse>;
    async fn confirm_txn(&self, request: &ConfirmationRequest) -> Result<ConfirmationResponse>;
}

/// Retrieves the rendered receipt document. The body is returned verbatim.
#[async_trait]
pub trait ReceiptFetcher: Send + Sync {
    async fn fetch(&self, request: &ReceiptRequest) -> Result<Vec<u8>>;
}

pub type GatewayBox = Box<dyn GatewayClient>;
pub type ReceiptFetcherBox = Box<dyn ReceiptFetcher>;

/// The network handle a single payment attempt owns for its whole lifetime.
pub struct Transport {
    pub gateway: GatewayBox,
    pub receipts: ReceiptFetcherBox,
}

/// Hands out a fresh [`Transport`] for each payment attempt.
pub trait Connector: Send + Sync {
    fn connect(&self) -> Result<Transport>;
}

pub type ConnectorBox = Box<dyn Connector>;
