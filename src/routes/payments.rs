use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::orders::PaymentCallbackQuery,
    error::AppResult,
    models::Order,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/paypal/success", get(paypal_success))
        .route("/paypal/cancel", get(paypal_cancel))
}

#[utoipa::path(
    get,
    path = "/api/payments/paypal/success",
    params(PaymentCallbackQuery),
    responses(
        (status = 200, description = "Payment captured", body = ApiResponse<Order>),
        (status = 400, description = "Missing token or payer id"),
        (status = 404, description = "Unknown order reference"),
        (status = 409, description = "Payment already processed"),
        (status = 500, description = "Gateway error")
    ),
    tag = "Payments"
)]
pub async fn paypal_success(
    State(state): State<AppState>,
    Query(query): Query<PaymentCallbackQuery>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = payment_service::complete_gateway_payment(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/payments/paypal/cancel",
    params(PaymentCallbackQuery),
    responses(
        (status = 200, description = "Payment abandoned", body = ApiResponse<serde_json::Value>)
    ),
    tag = "Payments"
)]
pub async fn paypal_cancel(
    Query(query): Query<PaymentCallbackQuery>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = payment_service::cancel_gateway_payment(query).await?;
    Ok(Json(resp))
}
