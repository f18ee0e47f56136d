use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set};

use crate::{
    audit,
    dto::users::{Profile, UpdateProfileRequest},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    state::AppState,
    validation,
};

pub async fn show_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Profile>> {
    let account = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "Profile",
        Profile::from(account),
        Some(Meta::empty()),
    ))
}

/// Updates name and phone. The email is the login identity and stays fixed.
pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<Profile>> {
    let name = payload.name.trim().to_string();
    let phone = payload.phone.trim().to_string();

    if name.chars().count() < 3 {
        return Err(AppError::BadRequest(
            "name must be at least 3 characters".into(),
        ));
    }
    if !validation::is_valid_phone(&phone) {
        return Err(AppError::BadRequest("phone must be 10 digits".into()));
    }

    let taken = Users::find()
        .filter(
            Condition::all()
                .add(UserCol::Phone.eq(phone.as_str()))
                .add(UserCol::Id.ne(user.user_id)),
        )
        .one(&state.orm)
        .await?;
    if taken.is_some() {
        return Err(AppError::Conflict("phone is already registered".into()));
    }

    let account = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: UserActive = account.into();
    active.name = Set(name);
    active.phone = Set(phone);
    let account = active.update(&state.orm).await?;

    audit::record(
        state,
        Some(user.user_id),
        "profile_update",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Profile updated",
        Profile::from(account),
        Some(Meta::empty()),
    ))
}
