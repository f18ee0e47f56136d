use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::{
    audit,
    dto::categories::{CategoryList, CreateCategoryRequest},
    entity::categories::{ActiveModel, Column, Entity as Categories},
    error::{AppError, AppResult},
    middleware::auth::AdminUser,
    models::Category,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn create_category(
    state: &AppState,
    admin: &AdminUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }

    let exist = Categories::find()
        .filter(Column::Name.eq(name.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::Conflict("category already exists".into()));
    }

    let category = ActiveModel {
        id: NotSet,
        name: Set(name),
        description: Set(payload.description),
        deleted: Set(false),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        state,
        None,
        "category_create",
        "categories",
        serde_json::json!({ "category_id": category.id, "actor": admin.subject }),
    )
    .await;

    Ok(ApiResponse::success(
        "Category created",
        Category::from(category),
        Some(Meta::empty()),
    ))
}

/// Storefront callers only see active categories.
pub async fn list_categories(
    state: &AppState,
    include_deleted: bool,
) -> AppResult<ApiResponse<CategoryList>> {
    let mut finder = Categories::find().order_by_asc(Column::Name);
    if !include_deleted {
        finder = finder.filter(Column::Deleted.eq(false));
    }
    let items: Vec<Category> = finder
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();

    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        None,
    ))
}

pub async fn delete_category(
    state: &AppState,
    admin: &AdminUser,
    id: i64,
) -> AppResult<ApiResponse<Category>> {
    set_deleted(state, admin, id, true).await
}

pub async fn recover_category(
    state: &AppState,
    admin: &AdminUser,
    id: i64,
) -> AppResult<ApiResponse<Category>> {
    set_deleted(state, admin, id, false).await
}

async fn set_deleted(
    state: &AppState,
    admin: &AdminUser,
    id: i64,
    deleted: bool,
) -> AppResult<ApiResponse<Category>> {
    let existing = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if existing.deleted == deleted {
        let state_name = if deleted { "deleted" } else { "active" };
        return Err(AppError::Conflict(format!(
            "category is already {state_name}"
        )));
    }

    let mut active: ActiveModel = existing.into();
    active.deleted = Set(deleted);
    let category = active.update(&state.orm).await?;

    let action = if deleted {
        "category_delete"
    } else {
        "category_recover"
    };
    audit::record(
        state,
        None,
        action,
        "categories",
        serde_json::json!({ "category_id": id, "actor": admin.subject }),
    )
    .await;

    Ok(ApiResponse::success(
        if deleted { "Deleted" } else { "Recovered" },
        Category::from(category),
        Some(Meta::empty()),
    ))
}
