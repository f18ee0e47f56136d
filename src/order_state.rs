//! Order and payment status vocabulary plus the transition rules.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum OrderStatus {
    Pending,
    #[serde(rename = "Pending COD Verification")]
    PendingCodVerification,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::PendingCodVerification => "Pending COD Verification",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Returned => "Returned",
        }
    }

    pub fn parse(value: &str) -> Result<Self, TransitionError> {
        match value {
            "Pending" => Ok(OrderStatus::Pending),
            "Pending COD Verification" => Ok(OrderStatus::PendingCodVerification),
            "Shipped" => Ok(OrderStatus::Shipped),
            "Delivered" => Ok(OrderStatus::Delivered),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            "Returned" => Ok(OrderStatus::Returned),
            other => Err(TransitionError::UnknownStatus(other.to_string())),
        }
    }

    /// Delivered, Returned and Cancelled only ever move on to Returned.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Returned | OrderStatus::Cancelled
        )
    }

    pub fn is_refund_trigger(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Returned)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PaymentStatus {
    Pending,
    Processing,
    Paid,
    Completed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Processing => "Processing",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Completed => "Completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Pending" => Some(PaymentStatus::Pending),
            "Processing" => Some(PaymentStatus::Processing),
            "Paid" => Some(PaymentStatus::Paid),
            "Completed" => Some(PaymentStatus::Completed),
            _ => None,
        }
    }

    /// Money has actually been collected for the order.
    pub fn is_settled(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Completed)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PaymentMethod {
    /// Cash on delivery.
    Cod,
    /// External gateway (PayPal).
    Gateway,
    Wallet,
    /// Any other method name; recorded as given and left in Processing.
    Offline(String),
}

impl PaymentMethod {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "cod" => PaymentMethod::Cod,
            "paypal" | "gateway" => PaymentMethod::Gateway,
            "wallet" => PaymentMethod::Wallet,
            _ => PaymentMethod::Offline(value.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PaymentMethod::Cod => "cod",
            PaymentMethod::Gateway => "paypal",
            PaymentMethod::Wallet => "wallet",
            PaymentMethod::Offline(name) => name,
        }
    }

    pub fn redeems_coupons(&self) -> bool {
        !matches!(self, PaymentMethod::Cod)
    }

    /// Status pair a freshly placed order starts in.
    pub fn initial_statuses(&self) -> (OrderStatus, PaymentStatus) {
        match self {
            PaymentMethod::Cod => (OrderStatus::PendingCodVerification, PaymentStatus::Pending),
            PaymentMethod::Wallet => (OrderStatus::Pending, PaymentStatus::Paid),
            PaymentMethod::Gateway | PaymentMethod::Offline(_) => {
                (OrderStatus::Pending, PaymentStatus::Processing)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("unknown order status {0:?}")]
    UnknownStatus(String),
    #[error("status {0} cannot be assigned directly")]
    NotAssignable(OrderStatus),
    #[error("order is already {0}")]
    AlreadyInStatus(OrderStatus),
    #[error("order cannot move from {from} to {to}")]
    Illegal { from: OrderStatus, to: OrderStatus },
}

/// Checks an administrative status change.
pub fn check_admin_transition(from: OrderStatus, to: OrderStatus) -> Result<(), TransitionError> {
    if to == OrderStatus::PendingCodVerification {
        return Err(TransitionError::NotAssignable(to));
    }
    if from == to && to.is_settled() {
        return Err(TransitionError::AlreadyInStatus(to));
    }
    if from == OrderStatus::Delivered && to == OrderStatus::Cancelled {
        return Err(TransitionError::Illegal { from, to });
    }
    if from.is_settled() && to != OrderStatus::Returned {
        return Err(TransitionError::Illegal { from, to });
    }
    Ok(())
}

/// Checks a cancellation requested by the order's owner.
pub fn check_user_cancel(from: OrderStatus) -> Result<(), TransitionError> {
    match from {
        OrderStatus::Cancelled => Err(TransitionError::AlreadyInStatus(from)),
        OrderStatus::Delivered | OrderStatus::Returned => Err(TransitionError::Illegal {
            from,
            to: OrderStatus::Cancelled,
        }),
        _ => Ok(()),
    }
}

/// Whether moving from `from` to `to` puts the reserved stock back.
/// Goods that never left the warehouse return to stock; a return after
/// shipping is restocked by hand once the goods are inspected.
pub fn releases_stock(from: OrderStatus, to: OrderStatus) -> bool {
    match to {
        OrderStatus::Cancelled => from != OrderStatus::Cancelled,
        OrderStatus::Returned => matches!(
            from,
            OrderStatus::Pending | OrderStatus::PendingCodVerification
        ),
        _ => false,
    }
}

/// Whether entering `to` credits the order total back to the wallet.
pub fn refund_due(to: OrderStatus, payment: PaymentStatus) -> bool {
    to.is_refund_trigger() && payment.is_settled()
}
