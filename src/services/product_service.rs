use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};

use crate::dto::products::{CreateProductRequest, ProductList, UpdateProductRequest};
use crate::{
    audit,
    entity::{
        categories::{Column as CategoryCol, Entity as Categories},
        products::{ActiveModel, Column, Entity as Products, Relation as ProductRelation},
    },
    error::{AppError, AppResult},
    middleware::auth::AdminUser,
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
    state::AppState,
};

/// Lists products. The storefront view hides deleted products and
/// products whose category is deleted; the admin view shows everything.
pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
    include_deleted: bool,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();

    if !include_deleted {
        condition = condition
            .add(Column::Deleted.eq(false))
            .add(CategoryCol::Deleted.eq(false));
    }

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col((Products, Column::Name)).ilike(pattern.clone()))
                .add(Expr::col((Products, Column::Description)).ilike(pattern)),
        );
    }

    if let Some(category_id) = query.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_col = query.sort_by.unwrap_or_default().column();
    let sort_order = query.sort_order.unwrap_or_default();

    let finder = Products::find()
        .join(JoinType::InnerJoin, ProductRelation::Categories.def())
        .filter(condition)
        .order_by(sort_col, sort_order.into())
        .order_by_desc(Column::Id);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    let data = ProductList { items };
    Ok(ApiResponse::success("Products", data, Some(meta)))
}

pub async fn get_product(state: &AppState, id: i64) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(id)
        .filter(Column::Deleted.eq(false))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Product", Product::from(product), None))
}

pub async fn create_product(
    state: &AppState,
    admin: &AdminUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    if payload.price < 0 || payload.stock < 0 {
        return Err(AppError::BadRequest(
            "price and stock cannot be negative".into(),
        ));
    }

    ensure_category(state, payload.category_id).await?;
    ensure_unique_name(state, &name, None).await?;

    let product = ActiveModel {
        id: NotSet,
        category_id: Set(payload.category_id),
        name: Set(name),
        description: Set(payload.description),
        price: Set(payload.price),
        stock: Set(payload.stock),
        deleted: Set(false),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        state,
        None,
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id, "actor": admin.subject }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    admin: &AdminUser,
    id: i64,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    if let Some(category_id) = payload.category_id {
        ensure_category(state, category_id).await?;
        active.category_id = Set(category_id);
    }
    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("name is required".into()));
        }
        ensure_unique_name(state, &name, Some(id)).await?;
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::BadRequest("price cannot be negative".into()));
        }
        active.price = Set(price);
    }
    if let Some(stock) = payload.stock {
        if stock < 0 {
            return Err(AppError::BadRequest("stock cannot be negative".into()));
        }
        active.stock = Set(stock);
    }

    let product = active.update(&state.orm).await?;

    audit::record(
        state,
        None,
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id, "actor": admin.subject }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    admin: &AdminUser,
    id: i64,
) -> AppResult<ApiResponse<Product>> {
    set_deleted(state, admin, id, true).await
}

pub async fn recover_product(
    state: &AppState,
    admin: &AdminUser,
    id: i64,
) -> AppResult<ApiResponse<Product>> {
    set_deleted(state, admin, id, false).await
}

async fn set_deleted(
    state: &AppState,
    admin: &AdminUser,
    id: i64,
    deleted: bool,
) -> AppResult<ApiResponse<Product>> {
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if existing.deleted == deleted {
        let state_name = if deleted { "deleted" } else { "active" };
        return Err(AppError::Conflict(format!("product is already {state_name}")));
    }

    let mut active: ActiveModel = existing.into();
    active.deleted = Set(deleted);
    let product = active.update(&state.orm).await?;

    let action = if deleted { "product_delete" } else { "product_recover" };
    audit::record(
        state,
        None,
        action,
        "products",
        serde_json::json!({ "product_id": id, "actor": admin.subject }),
    )
    .await;

    let message = if deleted { "Deleted" } else { "Recovered" };
    Ok(ApiResponse::success(
        message,
        Product::from(product),
        Some(Meta::empty()),
    ))
}

async fn ensure_category(state: &AppState, category_id: i64) -> AppResult<()> {
    let found = Categories::find_by_id(category_id)
        .filter(CategoryCol::Deleted.eq(false))
        .one(&state.orm)
        .await?;
    if found.is_none() {
        return Err(AppError::NotFound);
    }
    Ok(())
}

async fn ensure_unique_name(state: &AppState, name: &str, except: Option<i64>) -> AppResult<()> {
    let mut finder = Products::find().filter(Column::Name.eq(name));
    if let Some(id) = except {
        finder = finder.filter(Column::Id.ne(id));
    }
    if finder.one(&state.orm).await?.is_some() {
        return Err(AppError::Conflict("product name already exists".into()));
    }
    Ok(())
}
