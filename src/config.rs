use crate::error::{PaymentError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_SOAP_URL: &str = "https://ecommerce.redecard.com.br/pos_virtual/wskomerci/cap.asmx";
pub const DEFAULT_RECEIPT_URL: &str = "https://ecommerce.redecard.com.br/pos_virtual/cupom.asp";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Where and how to reach the gateway.
///
/// Every field is optional in the TOML file; missing ones take the production
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// SOAP endpoint of the authorization service.
    pub soap_url: String,
    /// Page rendering the receipt of a captured payment.
    pub receipt_url: String,
    /// Upper bound on each remote call, in seconds.
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            soap_url: DEFAULT_SOAP_URL.to_string(),
            receipt_url: DEFAULT_RECEIPT_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl GatewayConfig {
    pub fn from_toml(source: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| PaymentError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the file at `path`, or returns the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_toml(&std::fs::read_to_string(path)?),
            None => Ok(Self::default()),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(PaymentError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        for (name, url) in [("soap_url", &self.soap_url), ("receipt_url", &self.receipt_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(PaymentError::Config(format!(
                    "{name} must be an http(s) URL, got {url:?}"
                )));
            }
        }
        Ok(())
    }
}
