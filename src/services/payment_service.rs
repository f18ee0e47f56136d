use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};

use crate::{
    audit,
    dto::orders::PaymentCallbackQuery,
    entity::orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
    error::{AppError, AppResult},
    models::Order,
    order_state::{OrderStatus, PaymentStatus},
    response::{ApiResponse, Meta},
    services::wallet_service,
    state::AppState,
};

/// Handles the buyer returning from the gateway: captures the payment and
/// marks the referenced order Completed exactly once.
pub async fn complete_gateway_payment(
    state: &AppState,
    query: PaymentCallbackQuery,
) -> AppResult<ApiResponse<Order>> {
    let token = query
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("missing payment token".into()))?;
    if query.payer_id.as_deref().is_none_or(str::is_empty) {
        return Err(AppError::BadRequest("missing payer id".into()));
    }

    // The gateway refuses to capture twice, so a repeated callback is
    // answered from our own record before calling it.
    let known = Orders::find()
        .filter(OrderCol::GatewayOrderId.eq(token.as_str()))
        .one(&state.orm)
        .await?;
    if known.is_some_and(|order| payment_settled(&order.payment_status)) {
        return Err(AppError::Conflict("payment already processed".into()));
    }

    let capture = state.gateway.capture_order(&token).await?;
    if !capture.is_completed() {
        return Err(AppError::Internal(anyhow::anyhow!(
            "payment capture returned status {}",
            capture.status
        )));
    }
    let reference_id = capture.reference_id.ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("capture response has no order reference"))
    })?;

    let txn = state.orm.begin().await?;
    let order = Orders::find()
        .filter(OrderCol::ReferenceId.eq(reference_id.as_str()))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if payment_settled(&order.payment_status) {
        return Err(AppError::Conflict("payment already processed".into()));
    }

    let withdrawn = OrderStatus::parse(&order.status)?.is_refund_trigger();
    let now = Utc::now();
    let mut active: OrderActive = order.into();
    active.payment_status = Set(PaymentStatus::Completed.as_str().to_string());
    active.paid_at = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;

    // Money arrived for an order that was cancelled or returned meanwhile.
    let refunded = if withdrawn {
        wallet_service::credit_refund(&txn, order.user_id, order.id, order.total_amount).await?
    } else {
        false
    };

    txn.commit().await?;

    tracing::info!(
        order_id = order.id,
        reference_id = %order.reference_id,
        refunded,
        "gateway payment captured"
    );
    audit::record(
        state,
        Some(order.user_id),
        "payment_captured",
        "orders",
        serde_json::json!({ "order_id": order.id, "token": token, "refunded": refunded }),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment completed",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

fn payment_settled(status: &str) -> bool {
    PaymentStatus::parse(status).is_some_and(|status| status.is_settled())
}

/// The buyer abandoned the gateway page; the order is left as it is.
pub async fn cancel_gateway_payment(
    query: PaymentCallbackQuery,
) -> AppResult<ApiResponse<serde_json::Value>> {
    tracing::info!(token = ?query.token, "gateway payment abandoned");
    Ok(ApiResponse::success(
        "Payment cancelled",
        serde_json::json!({ "token": query.token }),
        Some(Meta::empty()),
    ))
}
