use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::{
    audit,
    dto::coupons::{ApplyCouponRequest, CouponList, CouponPreview, CreateCouponRequest},
    entity::coupons::{ActiveModel, Column, Entity as Coupons, Model as CouponModel},
    error::{AppError, AppResult, CheckoutError},
    middleware::auth::AdminUser,
    models::Coupon,
    pricing::{CouponRejection, CouponTerms},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn terms(model: &CouponModel) -> CouponTerms {
    CouponTerms {
        code: model.code.clone(),
        discount_percentage: model.discount_percentage,
        max_discount_amount: model.max_discount_amount,
        min_order_amount: model.min_order_amount,
        usage_limit: model.usage_limit,
        used_count: model.used_count,
        starts_at: model.starts_at.with_timezone(&Utc),
        ends_at: model.ends_at.with_timezone(&Utc),
    }
}

pub async fn create_coupon(
    state: &AppState,
    admin: &AdminUser,
    payload: CreateCouponRequest,
) -> AppResult<ApiResponse<Coupon>> {
    let code = payload.code.trim().to_uppercase();
    if code.is_empty() {
        return Err(AppError::BadRequest("coupon code is required".into()));
    }
    if !(1..=100).contains(&payload.discount_percentage) {
        return Err(AppError::BadRequest(
            "discount percentage must be between 1 and 100".into(),
        ));
    }
    if payload.max_discount_amount < 0 || payload.min_order_amount < 0 || payload.usage_limit < 0
    {
        return Err(AppError::BadRequest(
            "amounts and usage limit cannot be negative".into(),
        ));
    }
    if payload.ends_at < payload.starts_at {
        return Err(AppError::BadRequest(
            "end date must not be before start date".into(),
        ));
    }

    let exist = Coupons::find()
        .filter(Column::Code.eq(code.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::Conflict("coupon code already exists".into()));
    }

    let coupon = ActiveModel {
        id: NotSet,
        code: Set(code),
        discount_percentage: Set(payload.discount_percentage),
        max_discount_amount: Set(payload.max_discount_amount),
        min_order_amount: Set(payload.min_order_amount),
        starts_at: Set(payload.starts_at.into()),
        ends_at: Set(payload.ends_at.into()),
        usage_limit: Set(payload.usage_limit),
        used_count: Set(0),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        state,
        None,
        "coupon_create",
        "coupons",
        serde_json::json!({ "coupon_id": coupon.id, "actor": admin.subject }),
    )
    .await;

    Ok(ApiResponse::success(
        "Coupon created",
        Coupon::from(coupon),
        Some(Meta::empty()),
    ))
}

/// Coupons that have not expired yet.
pub async fn list_coupons(state: &AppState) -> AppResult<ApiResponse<CouponList>> {
    let items = Coupons::find()
        .filter(Column::EndsAt.gte(Utc::now()))
        .order_by_asc(Column::EndsAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Coupon::from)
        .collect();

    Ok(ApiResponse::success("Coupons", CouponList { items }, None))
}

pub async fn remove_coupon(
    state: &AppState,
    admin: &AdminUser,
    id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Coupons::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        state,
        None,
        "coupon_remove",
        "coupons",
        serde_json::json!({ "coupon_id": id, "actor": admin.subject }),
    )
    .await;

    Ok(ApiResponse::success(
        "Coupon removed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Evaluates a coupon against an amount without redeeming it.
pub async fn preview_coupon(
    state: &AppState,
    payload: ApplyCouponRequest,
) -> AppResult<ApiResponse<CouponPreview>> {
    if payload.order_amount < 0 {
        return Err(AppError::BadRequest("order amount cannot be negative".into()));
    }
    let code = payload.code.trim().to_uppercase();
    let coupon = Coupons::find()
        .filter(Column::Code.eq(code.as_str()))
        .one(&state.orm)
        .await?
        .ok_or(CheckoutError::InvalidCoupon(CouponRejection::NotFound))?;

    let discount = terms(&coupon)
        .discount_for(payload.order_amount, Utc::now())
        .map_err(CheckoutError::InvalidCoupon)?;

    Ok(ApiResponse::success(
        "Coupon applied",
        CouponPreview {
            code: coupon.code,
            order_amount: payload.order_amount,
            discount,
            final_price: (payload.order_amount - discount).max(0),
        },
        Some(Meta::empty()),
    ))
}
