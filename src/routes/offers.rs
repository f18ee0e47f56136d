use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};

use crate::{
    dto::offers::{CreateOfferRequest, OfferList},
    error::AppResult,
    middleware::auth::AdminUser,
    models::Offer,
    response::ApiResponse,
    services::offer_service,
    state::AppState,
};

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_offers).post(add_offer))
        .route("/product/{product_id}", delete(remove_offer))
}

#[utoipa::path(
    get,
    path = "/api/admin/offers",
    responses(
        (status = 200, description = "Current and upcoming offers", body = ApiResponse<OfferList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_offers(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<ApiResponse<OfferList>>> {
    let resp = offer_service::list_offers(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/offers",
    request_body = CreateOfferRequest,
    responses(
        (status = 200, description = "Offer added", body = ApiResponse<Offer>),
        (status = 400, description = "Invalid offer"),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Product already has an offer in that window")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn add_offer(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<CreateOfferRequest>,
) -> AppResult<Json<ApiResponse<Offer>>> {
    let resp = offer_service::add_offer(&state, &admin, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/offers/product/{product_id}",
    params(("product_id" = i64, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Offers removed", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "No offer for product")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn remove_offer(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(product_id): Path<i64>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = offer_service::remove_offer(&state, &admin, product_id).await?;
    Ok(Json(resp))
}
