use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Product;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLine {
    pub id: i64,
    pub product: Product,
    pub quantity: i32,
    pub subtotal: i64,
}
