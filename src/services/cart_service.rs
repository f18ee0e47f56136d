use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::{
    audit,
    dto::cart::{AddToCartRequest, CartLine, CartView},
    entity::{
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartItem, Product},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn view_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let rows = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_desc(CartCol::CreatedAt)
        .find_also_related(Products)
        .all(&state.orm)
        .await?;

    let items: Vec<CartLine> = rows
        .into_iter()
        .filter_map(|(line, product)| {
            let product = product?;
            Some(CartLine {
                id: line.id,
                subtotal: product.price * i64::from(line.quantity),
                quantity: line.quantity,
                product: Product::from(product),
            })
        })
        .collect();
    let total = items.iter().map(|line| line.subtotal).sum();

    Ok(ApiResponse::success(
        "OK",
        CartView { items, total },
        Some(Meta::empty()),
    ))
}

/// Adds `quantity` to the user's line for the product, creating it if needed.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let product = Products::find_by_id(payload.product_id)
        .filter(ProdCol::Deleted.eq(false))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let exist = CartItems::find()
        .filter(
            Condition::all()
                .add(CartCol::UserId.eq(user.user_id))
                .add(CartCol::ProductId.eq(payload.product_id)),
        )
        .one(&state.orm)
        .await?;

    let current = exist.as_ref().map(|item| item.quantity).unwrap_or(0);
    let wanted = current
        .checked_add(payload.quantity)
        .ok_or_else(|| AppError::BadRequest("quantity is too large".into()))?;
    let cap = state.config.cart_max_qty_per_product;
    if wanted > cap {
        return Err(AppError::Conflict(format!(
            "at most {cap} units of a product can be in the cart"
        )));
    }
    if wanted > product.stock {
        return Err(AppError::Conflict(format!(
            "only {} units of {} are in stock",
            product.stock, product.name
        )));
    }

    let now = Utc::now();
    let cart_item = match exist {
        Some(item) => {
            CartItems::update_many()
                .col_expr(
                    CartCol::Quantity,
                    Expr::col(CartCol::Quantity).add(payload.quantity),
                )
                .col_expr(CartCol::UpdatedAt, Expr::value(now))
                .filter(CartCol::Id.eq(item.id))
                .exec(&state.orm)
                .await?;
            CartItems::find_by_id(item.id)
                .one(&state.orm)
                .await?
                .ok_or(AppError::NotFound)?
        }
        None => {
            CartActive {
                id: NotSet,
                user_id: Set(user.user_id),
                product_id: Set(payload.product_id),
                quantity: Set(payload.quantity),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            }
            .insert(&state.orm)
            .await?
        }
    };

    audit::record(
        state,
        Some(user.user_id),
        "cart_update",
        "cart_items",
        serde_json::json!({ "product_id": payload.product_id, "quantity": cart_item.quantity }),
    )
    .await;

    Ok(ApiResponse::success("OK", CartItem::from(cart_item), None))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(
            Condition::all()
                .add(CartCol::UserId.eq(user.user_id))
                .add(CartCol::ProductId.eq(product_id)),
        )
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        state,
        Some(user.user_id),
        "cart_remove",
        "cart_items",
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({ "removed": result.rows_affected }),
        Some(Meta::empty()),
    ))
}
