use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::{
    audit,
    dto::wishlist::{AddWishlistRequest, WishlistProductList},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

#[derive(FromRow)]
struct WishlistProductRow {
    id: i64,
    category_id: i64,
    name: String,
    description: Option<String>,
    price: i64,
    stock: i32,
    deleted: bool,
    created_at: DateTime<Utc>,
}

impl From<WishlistProductRow> for Product {
    fn from(row: WishlistProductRow) -> Self {
        Product {
            id: row.id,
            category_id: row.category_id,
            name: row.name,
            description: row.description,
            price: row.price,
            stock: row.stock,
            deleted: row.deleted,
            created_at: row.created_at,
        }
    }
}

pub async fn list_wishlist(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<WishlistProductList>> {
    let (page, limit, offset) = pagination.normalize();
    let rows = sqlx::query_as::<_, WishlistProductRow>(
        r#"
        SELECT p.id, p.category_id, p.name, p.description, p.price, p.stock, p.deleted, p.created_at
        FROM wishlists w
        JOIN products p ON p.id = w.product_id
        WHERE w.user_id = $1
        ORDER BY w.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(state.pool())
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM wishlists WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(state.pool())
        .await?;

    let meta = Meta::new(page, limit, total.0);
    let data = WishlistProductList {
        items: rows.into_iter().map(Product::from).collect(),
    };
    Ok(ApiResponse::success("OK", data, Some(meta)))
}

/// Adding a product that is already wishlisted is a no-op.
pub async fn add_to_wishlist(
    state: &AppState,
    user: &AuthUser,
    payload: AddWishlistRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let product_exists: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM products WHERE id = $1 AND deleted = FALSE")
            .bind(payload.product_id)
            .fetch_optional(state.pool())
            .await?;

    if product_exists.is_none() {
        return Err(AppError::NotFound);
    }

    let inserted = sqlx::query(
        r#"
        INSERT INTO wishlists (user_id, product_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, product_id) DO NOTHING
        "#,
    )
    .bind(user.user_id)
    .bind(payload.product_id)
    .execute(state.pool())
    .await?;

    if inserted.rows_affected() > 0 {
        audit::record(
            state,
            Some(user.user_id),
            "wishlist_add",
            "wishlists",
            serde_json::json!({ "product_id": payload.product_id }),
        )
        .await;
    }

    Ok(ApiResponse::success(
        "Added to wishlist",
        serde_json::json!({ "product_id": payload.product_id }),
        Some(Meta::empty()),
    ))
}

pub async fn remove_from_wishlist(
    state: &AppState,
    user: &AuthUser,
    product_id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM wishlists WHERE user_id = $1 AND product_id = $2")
        .bind(user.user_id)
        .bind(product_id)
        .execute(state.pool())
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        state,
        Some(user.user_id),
        "wishlist_remove",
        "wishlists",
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed from wishlist",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn clear_wishlist(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM wishlists WHERE user_id = $1")
        .bind(user.user_id)
        .execute(state.pool())
        .await?;

    Ok(ApiResponse::success(
        "Wishlist cleared",
        serde_json::json!({ "removed": result.rows_affected() }),
        Some(Meta::empty()),
    ))
}
