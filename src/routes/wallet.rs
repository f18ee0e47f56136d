use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::wallet::{WalletTransactionList, WalletView},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::Pagination,
    services::wallet_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(view_wallet))
        .route("/transactions", get(list_transactions))
}

#[utoipa::path(
    get,
    path = "/api/wallet",
    responses(
        (status = 200, description = "Wallet balance checked against the ledger", body = ApiResponse<WalletView>)
    ),
    security(("bearer_auth" = [])),
    tag = "Wallet"
)]
pub async fn view_wallet(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<WalletView>>> {
    let resp = wallet_service::view_wallet(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/wallet/transactions",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Wallet ledger, newest first", body = ApiResponse<WalletTransactionList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Wallet"
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<WalletTransactionList>>> {
    let resp = wallet_service::list_transactions(&state, &user, pagination).await?;
    Ok(Json(resp))
}
