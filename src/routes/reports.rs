use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::reports::{Dashboard, DashboardQuery, SalesReport, SalesReportQuery, TopSelling},
    error::AppResult,
    middleware::auth::AdminUser,
    response::ApiResponse,
    services::report_service,
    state::AppState,
};

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/sales", get(sales_report))
        .route("/dashboard", get(dashboard))
        .route("/top-selling", get(top_selling))
}

#[utoipa::path(
    get,
    path = "/api/admin/reports/sales",
    params(SalesReportQuery),
    responses(
        (status = 200, description = "Sales between two dates, inclusive", body = ApiResponse<SalesReport>),
        (status = 400, description = "Invalid date range"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn sales_report(
    State(state): State<AppState>,
    admin: AdminUser,
    Query(query): Query<SalesReportQuery>,
) -> AppResult<Json<ApiResponse<SalesReport>>> {
    let resp = report_service::sales_report(&state, &admin, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/reports/dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Totals for the period", body = ApiResponse<Dashboard>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    admin: AdminUser,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<ApiResponse<Dashboard>>> {
    let resp = report_service::dashboard(&state, &admin, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/reports/top-selling",
    responses(
        (status = 200, description = "Best selling products and categories", body = ApiResponse<TopSelling>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn top_selling(
    State(state): State<AppState>,
    admin: AdminUser,
) -> AppResult<Json<ApiResponse<TopSelling>>> {
    let resp = report_service::top_selling(&state, &admin).await?;
    Ok(Json(resp))
}
