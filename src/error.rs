use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    gateway::GatewayError,
    order_state::TransitionError,
    otp::OtpError,
    pricing::CouponRejection,
    response::{ApiResponse, Meta},
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Unauthorized {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Conflict {0}")]
    Conflict(String),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Payment gateway error")]
    Gateway(#[from] GatewayError),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

/// Reasons a checkout is refused before anything is committed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Address not found")]
    AddressNotFound,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Insufficient stock for product {product_id}")]
    InsufficientStock { product_id: i64 },

    #[error("Invalid coupon: {0}")]
    InvalidCoupon(#[from] CouponRejection),

    #[error("Cash on delivery is not allowed for orders above {limit}")]
    CodLimitExceeded { limit: i64 },

    #[error("Insufficient wallet balance")]
    InsufficientWalletBalance,
}

impl From<OtpError> for AppError {
    fn from(err: OtpError) -> Self {
        match err {
            OtpError::ResendTooSoon { .. } => AppError::BadRequest(err.to_string()),
            OtpError::Store(inner) => AppError::Internal(inner),
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Checkout(err) => match err {
                CheckoutError::AddressNotFound => StatusCode::NOT_FOUND,
                CheckoutError::InsufficientStock { .. } => StatusCode::CONFLICT,
                CheckoutError::InvalidCoupon(CouponRejection::UsageLimitReached) => {
                    StatusCode::CONFLICT
                }
                CheckoutError::EmptyCart
                | CheckoutError::InvalidCoupon(_)
                | CheckoutError::CodLimitExceeded { .. }
                | CheckoutError::InsufficientWalletBalance => StatusCode::BAD_REQUEST,
            },
            AppError::Transition(err) => match err {
                TransitionError::UnknownStatus(_) | TransitionError::NotAssignable(_) => {
                    StatusCode::BAD_REQUEST
                }
                TransitionError::AlreadyInStatus(_) | TransitionError::Illegal { .. } => {
                    StatusCode::CONFLICT
                }
            },
            AppError::DbError(_)
            | AppError::OrmError(_)
            | AppError::Gateway(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            match &self {
                AppError::DbError(err) => tracing::error!(error = %err, "database failure"),
                AppError::OrmError(err) => tracing::error!(error = %err, "orm failure"),
                AppError::Gateway(err) => tracing::error!(error = %err, "gateway failure"),
                AppError::Internal(err) => tracing::error!(error = ?err, "internal failure"),
                _ => {}
            }
        }
        let message = self.to_string();

        let body = ApiResponse {
            message: message.clone(),
            data: Some(ErrorData { error: message }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
