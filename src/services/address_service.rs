use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::{
    dto::addresses::{AddressList, AddressRequest},
    entity::addresses::{ActiveModel, Column, Entity as Addresses, Model as AddressModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Address,
    response::{ApiResponse, Meta},
    state::AppState,
    validation,
};

fn validate(payload: &AddressRequest) -> AppResult<()> {
    if payload.address_line.trim().chars().count() < 5 {
        return Err(AppError::BadRequest(
            "address line must be at least 5 characters".into(),
        ));
    }
    if payload.city.trim().chars().count() < 3 {
        return Err(AppError::BadRequest(
            "city must be at least 3 characters".into(),
        ));
    }
    if !validation::is_valid_zip(payload.zip_code.trim()) {
        return Err(AppError::BadRequest("zip code must be 6 digits".into()));
    }
    Ok(())
}

async fn find_owned(state: &AppState, user: &AuthUser, id: i64) -> AppResult<AddressModel> {
    Addresses::find()
        .filter(
            Condition::all()
                .add(Column::Id.eq(id))
                .add(Column::UserId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn add_address(
    state: &AppState,
    user: &AuthUser,
    payload: AddressRequest,
) -> AppResult<ApiResponse<Address>> {
    validate(&payload)?;
    let now = Utc::now();
    let address = ActiveModel {
        id: NotSet,
        user_id: Set(user.user_id),
        address_line: Set(payload.address_line.trim().to_string()),
        city: Set(payload.city.trim().to_string()),
        zip_code: Set(payload.zip_code.trim().to_string()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Address added",
        Address::from(address),
        Some(Meta::empty()),
    ))
}

pub async fn list_addresses(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AddressList>> {
    let items = Addresses::find()
        .filter(Column::UserId.eq(user.user_id))
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Address::from)
        .collect();

    Ok(ApiResponse::success("OK", AddressList { items }, None))
}

pub async fn update_address(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    payload: AddressRequest,
) -> AppResult<ApiResponse<Address>> {
    validate(&payload)?;
    let existing = find_owned(state, user, id).await?;

    let mut active: ActiveModel = existing.into();
    active.address_line = Set(payload.address_line.trim().to_string());
    active.city = Set(payload.city.trim().to_string());
    active.zip_code = Set(payload.zip_code.trim().to_string());
    active.updated_at = Set(Utc::now().into());
    let address = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Address updated",
        Address::from(address),
        Some(Meta::empty()),
    ))
}

pub async fn delete_address(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = find_owned(state, user, id).await?;
    Addresses::delete_by_id(existing.id).exec(&state.orm).await?;

    Ok(ApiResponse::success(
        "Address deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
