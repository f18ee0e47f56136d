use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::{Order, OrderItem};

/// Checkout takes its inputs from the query string.
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct PlaceOrderQuery {
    pub address_id: i64,
    pub coupon_code: Option<String>,
    pub payment_method: String,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct WalletPurchaseQuery {
    pub address_id: i64,
    pub coupon_code: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    /// Where the buyer approves a gateway payment.
    pub approval_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct PaymentCallbackQuery {
    pub token: Option<String>,
    #[serde(rename = "PayerID")]
    pub payer_id: Option<String>,
}
