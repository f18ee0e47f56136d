use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{GatewayCapture, GatewayError, GatewayOrder, GatewayOrderRequest, PaymentGateway};
use crate::config::PayPalConfig;

/// PayPal Orders v2 client.
pub struct PayPalGateway {
    client: Client,
    config: PayPalConfig,
}

#[derive(Deserialize)]
struct AccessToken {
    access_token: String,
}

#[derive(Serialize)]
struct CreateOrderBody<'a> {
    intent: &'static str,
    purchase_units: Vec<PurchaseUnit<'a>>,
    application_context: ApplicationContext<'a>,
}

#[derive(Serialize)]
struct PurchaseUnit<'a> {
    reference_id: &'a str,
    amount: Amount<'a>,
}

#[derive(Serialize)]
struct Amount<'a> {
    currency_code: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct ApplicationContext<'a> {
    return_url: &'a str,
    cancel_url: &'a str,
}

#[derive(Deserialize)]
struct OrderResponse {
    id: String,
    #[serde(default)]
    links: Vec<Link>,
}

#[derive(Deserialize)]
struct Link {
    href: String,
    rel: String,
}

#[derive(Deserialize)]
struct CaptureResponse {
    status: String,
    #[serde(default)]
    purchase_units: Vec<CapturedUnit>,
}

#[derive(Deserialize)]
struct CapturedUnit {
    reference_id: Option<String>,
}

impl PayPalGateway {
    pub fn new(config: PayPalConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn access_token(&self) -> Result<String, GatewayError> {
        if self.config.client_id.is_empty() || self.config.secret.is_empty() {
            return Err(GatewayError::NotConfigured);
        }
        let response = self
            .client
            .post(format!("{}/v1/oauth2/token", self.config.base_url))
            .basic_auth(&self.config.client_id, Some(&self.config.secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        let token: AccessToken = checked(response).await?.json().await?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl PaymentGateway for PayPalGateway {
    async fn create_order(
        &self,
        request: GatewayOrderRequest,
    ) -> Result<GatewayOrder, GatewayError> {
        let token = self.access_token().await?;
        let body = CreateOrderBody {
            intent: "CAPTURE",
            purchase_units: vec![PurchaseUnit {
                reference_id: &request.reference_id,
                amount: Amount {
                    currency_code: &request.currency,
                    value: &request.amount,
                },
            }],
            application_context: ApplicationContext {
                return_url: &self.config.return_url,
                cancel_url: &self.config.cancel_url,
            },
        };

        let response = self
            .client
            .post(format!("{}/v2/checkout/orders", self.config.base_url))
            .bearer_auth(token)
            .header("PayPal-Request-Id", Uuid::new_v4().to_string())
            .json(&body)
            .send()
            .await?;
        let order: OrderResponse = checked(response).await?.json().await?;

        let approval_url = order
            .links
            .into_iter()
            .find(|link| link.rel == "approve")
            .map(|link| link.href)
            .ok_or(GatewayError::MissingField("approve link"))?;

        Ok(GatewayOrder {
            id: order.id,
            approval_url,
        })
    }

    async fn capture_order(&self, token: &str) -> Result<GatewayCapture, GatewayError> {
        let access = self.access_token().await?;
        let response = self
            .client
            .post(format!(
                "{}/v2/checkout/orders/{}/capture",
                self.config.base_url, token
            ))
            .bearer_auth(access)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        let capture: CaptureResponse = checked(response).await?.json().await?;

        let reference_id = capture
            .purchase_units
            .into_iter()
            .filter_map(|unit| unit.reference_id)
            .find(|reference| !reference.is_empty());

        Ok(GatewayCapture {
            status: capture.status,
            reference_id,
        })
    }
}

async fn checked(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::Rejected {
        status: status.as_u16(),
        body,
    })
}
