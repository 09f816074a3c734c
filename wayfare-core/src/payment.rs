use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    Wallet,
    Bank,
}

impl GatewayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayKind::Wallet => "wallet",
            GatewayKind::Bank => "bank",
        }
    }
}

/// Fields a gateway needs to start a payment attempt. Amounts are in major
/// units; adapters apply their own wire scaling.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub order_ref: String,
    pub amount: Decimal,
    pub order_info: String,
}

/// What a gateway hands back for the client to continue with.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentInitiation {
    pub gateway: GatewayKind,
    pub order_ref: String,
    pub pay_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_payload: Option<String>,
}

/// A verified and interpreted gateway callback.
#[derive(Debug, Clone)]
pub struct CallbackVerdict {
    pub order_ref: String,
    /// Reported amount, descaled back to major units.
    pub amount: Decimal,
    pub success: bool,
    pub signature_valid: bool,
    /// Raw gateway result code, kept for logging.
    pub code: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("gateway rejected the request: {0}")]
    Rejected(String),
    #[error("malformed callback: {0}")]
    MalformedCallback(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn kind(&self) -> GatewayKind;

    /// Start a payment attempt and return the redirect / QR material.
    async fn create_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentInitiation, GatewayError>;

    /// Verify the signature on a callback and interpret its result code.
    /// An Err means the input was not a recognizable callback at all;
    /// business failures come back as a verdict with `success == false`.
    fn parse_callback(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<CallbackVerdict, GatewayError>;
}

/// Seam for the wallet gateway's outbound create-payment POST. Production
/// uses an HTTP client; tests swap in a canned transport.
#[async_trait]
pub trait WalletTransport: Send + Sync {
    async fn post_create(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, GatewayError>;
}
