use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};

use crate::{
    dto::orders::{OrderList, OrderWithItems, PlaceOrderQuery, PlacedOrder, WalletPurchaseQuery},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Order,
    order_state::PaymentMethod,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/checkout", post(checkout))
        .route("/wallet-purchase", post(wallet_purchase))
        .route("/{id}", get(get_order))
        .route("/{id}/cancel", post(cancel_order))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "List orders of the current user", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/checkout",
    params(PlaceOrderQuery),
    responses(
        (status = 200, description = "Order placed from the cart", body = ApiResponse<PlacedOrder>),
        (status = 400, description = "Empty cart, invalid coupon or unsupported payment method"),
        (status = 404, description = "Address not found"),
        (status = 409, description = "Insufficient stock"),
        (status = 500, description = "Payment gateway unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PlaceOrderQuery>,
) -> AppResult<Json<ApiResponse<PlacedOrder>>> {
    let resp = order_service::place_order(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/wallet-purchase",
    params(WalletPurchaseQuery),
    responses(
        (status = 200, description = "Order paid from the wallet", body = ApiResponse<PlacedOrder>),
        (status = 400, description = "Empty cart, invalid coupon or insufficient balance"),
        (status = 404, description = "Address not found"),
        (status = 409, description = "Insufficient stock")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn wallet_purchase(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<WalletPurchaseQuery>,
) -> AppResult<Json<ApiResponse<PlacedOrder>>> {
    let query = PlaceOrderQuery {
        address_id: query.address_id,
        coupon_code: query.coupon_code,
        payment_method: PaymentMethod::Wallet.as_str().to_string(),
    };
    let resp = order_service::place_order(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = i64, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::get_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/cancel",
    params(("id" = i64, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order cancelled", body = ApiResponse<Order>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Order can no longer be cancelled")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::cancel_order(&state, &user, id).await?;
    Ok(Json(resp))
}
