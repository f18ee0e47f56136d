//! External payment gateway seam.

use async_trait::async_trait;
use thiserror::Error;

mod paypal;

pub use paypal::PayPalGateway;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("gateway rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("gateway response is missing {0}")]
    MissingField(&'static str),
    #[error("gateway is not configured")]
    NotConfigured,
}

#[derive(Debug, Clone)]
pub struct GatewayOrderRequest {
    /// Our order reference id, echoed back by the gateway on capture.
    pub reference_id: String,
    /// Decimal amount in the gateway currency, e.g. `"2.16"`.
    pub amount: String,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct GatewayOrder {
    pub id: String,
    pub approval_url: String,
}

#[derive(Debug, Clone)]
pub struct GatewayCapture {
    pub status: String,
    pub reference_id: Option<String>,
}

impl GatewayCapture {
    pub fn is_completed(&self) -> bool {
        self.status.eq_ignore_ascii_case("COMPLETED")
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(
        &self,
        request: GatewayOrderRequest,
    ) -> Result<GatewayOrder, GatewayError>;

    async fn capture_order(&self, token: &str) -> Result<GatewayCapture, GatewayError>;
}

/// Converts a minor-unit total into the gateway currency at `rate`.
pub fn gateway_amount(total_minor: i64, rate: f64) -> String {
    let major = total_minor as f64 / 100.0;
    format!("{:.2}", major * rate)
}
