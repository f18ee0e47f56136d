//! Discount resolution for checkout.
//!
//! Amounts are minor currency units. The coupon discount is taken on the
//! cart total, offer discounts per line on the line subtotal, and the two
//! are summed; the final total never goes below zero.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CouponRejection {
    #[error("coupon not found")]
    NotFound,
    #[error("coupon is not valid at this time")]
    OutsideValidityWindow,
    #[error("coupon usage limit reached")]
    UsageLimitReached,
    #[error("order total does not meet the coupon minimum")]
    BelowMinimumOrder,
}

/// A cart line priced at checkout time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: i64,
    /// Percentage of the offer active on the product, if any.
    pub offer_percentage: Option<i32>,
}

impl PricedLine {
    pub fn subtotal(&self) -> i64 {
        self.unit_price * i64::from(self.quantity)
    }

    pub fn offer_discount(&self) -> i64 {
        match self.offer_percentage {
            Some(pct) => percent_of(self.subtotal(), pct),
            None => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponTerms {
    pub code: String,
    pub discount_percentage: i32,
    pub max_discount_amount: i64,
    pub min_order_amount: i64,
    pub usage_limit: i32,
    pub used_count: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl CouponTerms {
    /// Validates the coupon against `cart_total` and returns its discount.
    pub fn discount_for(
        &self,
        cart_total: i64,
        now: DateTime<Utc>,
    ) -> Result<i64, CouponRejection> {
        if now < self.starts_at || now > self.ends_at {
            return Err(CouponRejection::OutsideValidityWindow);
        }
        if self.used_count >= self.usage_limit {
            return Err(CouponRejection::UsageLimitReached);
        }
        if cart_total < self.min_order_amount {
            return Err(CouponRejection::BelowMinimumOrder);
        }
        Ok(percent_of(cart_total, self.discount_percentage).min(self.max_discount_amount))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Quote {
    pub subtotal: i64,
    pub coupon_discount: i64,
    pub offer_discount: i64,
    pub total: i64,
}

/// Prices a cart. `coupon` is only passed when a code was supplied and the
/// payment method is allowed to redeem coupons.
pub fn quote(
    lines: &[PricedLine],
    coupon: Option<&CouponTerms>,
    now: DateTime<Utc>,
) -> Result<Quote, CouponRejection> {
    let subtotal: i64 = lines.iter().map(PricedLine::subtotal).sum();
    let coupon_discount = match coupon {
        Some(terms) => terms.discount_for(subtotal, now)?,
        None => 0,
    };
    let offer_discount: i64 = lines.iter().map(PricedLine::offer_discount).sum();
    let total = (subtotal - coupon_discount - offer_discount).max(0);

    Ok(Quote {
        subtotal,
        coupon_discount,
        offer_discount,
        total,
    })
}

/// `amount * pct / 100`, truncated toward zero.
pub fn percent_of(amount: i64, pct: i32) -> i64 {
    amount * i64::from(pct) / 100
}
