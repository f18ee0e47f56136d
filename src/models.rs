use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::{
    addresses, cart_items, categories, coupons, offers, order_items, orders, products, users,
    wallet_transactions,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub verified: bool,
    pub blocked: bool,
    pub wallet_balance: i64,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            verified: model.verified,
            blocked: model.blocked,
            wallet_balance: model.wallet_balance,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            deleted: model.deleted,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub stock: i32,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            category_id: model.category_id,
            name: model.name,
            description: model.description,
            price: model.price,
            stock: model.stock,
            deleted: model.deleted,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub id: i64,
    pub user_id: i64,
    pub address_line: String,
    pub city: String,
    pub zip_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<addresses::Model> for Address {
    fn from(model: addresses::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            address_line: model.address_line,
            city: model.city,
            zip_code: model.zip_code,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: i64,
    pub product_id: i64,
    pub user_id: i64,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl From<cart_items::Model> for CartItem {
    fn from(model: cart_items::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            user_id: model.user_id,
            quantity: model.quantity,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: i64,
    pub reference_id: String,
    pub user_id: i64,
    pub total_amount: i64,
    pub coupon_discount: i64,
    pub offer_discount: i64,
    pub coupon_code: Option<String>,
    pub payment_method: String,
    pub payment_status: String,
    pub status: String,
    pub address_line: String,
    pub city: String,
    pub zip_code: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            reference_id: model.reference_id,
            user_id: model.user_id,
            total_amount: model.total_amount,
            coupon_discount: model.coupon_discount,
            offer_discount: model.offer_discount,
            coupon_code: model.coupon_code,
            payment_method: model.payment_method,
            payment_status: model.payment_status,
            status: model.status,
            address_line: model.address_line,
            city: model.city,
            zip_code: model.zip_code,
            paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub price: i64,
    pub subtotal: i64,
    pub created_at: DateTime<Utc>,
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            quantity: model.quantity,
            price: model.price,
            subtotal: model.subtotal,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Coupon {
    pub id: i64,
    pub code: String,
    pub discount_percentage: i32,
    pub max_discount_amount: i64,
    pub min_order_amount: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub usage_limit: i32,
    pub used_count: i32,
}

impl From<coupons::Model> for Coupon {
    fn from(model: coupons::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            discount_percentage: model.discount_percentage,
            max_discount_amount: model.max_discount_amount,
            min_order_amount: model.min_order_amount,
            starts_at: model.starts_at.with_timezone(&Utc),
            ends_at: model.ends_at.with_timezone(&Utc),
            usage_limit: model.usage_limit,
            used_count: model.used_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Offer {
    pub id: i64,
    pub product_id: i64,
    pub discount_percentage: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl From<offers::Model> for Offer {
    fn from(model: offers::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            discount_percentage: model.discount_percentage,
            starts_at: model.starts_at.with_timezone(&Utc),
            ends_at: model.ends_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WalletTransaction {
    pub id: i64,
    pub order_id: Option<i64>,
    pub amount: i64,
    pub transaction_type: String,
    pub created_at: DateTime<Utc>,
}

impl From<wallet_transactions::Model> for WalletTransaction {
    fn from(model: wallet_transactions::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            amount: model.amount,
            transaction_type: model.transaction_type,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
