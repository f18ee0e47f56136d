use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};

use crate::{
    audit,
    dto::{
        orders::{OrderList, OrderWithItems, UpdateOrderStatusRequest},
        products::{InventoryAdjustRequest, LowStockQuery, ProductList},
        users::{UserList, UserListQuery},
    },
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AdminUser,
    models::{Order, Product, User},
    order_state::{self, OrderStatus},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    _admin: &AdminUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let finder = Orders::find()
        .filter(condition)
        .order_by(OrderCol::CreatedAt, query.sort_order.unwrap_or_default().into())
        .order_by_desc(OrderCol::Id);

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);

    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order_admin(
    state: &AppState,
    _admin: &AdminUser,
    id: i64,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let data = order_service::with_items(&state.orm, order).await?;
    Ok(ApiResponse::success(
        "Order found",
        data,
        Some(Meta::empty()),
    ))
}

/// Moves an order to a new status. The current status is read under a row
/// lock so two concurrent updates cannot both pass the transition check.
pub async fn update_order_status(
    state: &AppState,
    admin: &AdminUser,
    id: i64,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let to = OrderStatus::parse(payload.status.trim())?;

    let txn = state.orm.begin().await?;
    let existing = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let from = OrderStatus::parse(&existing.status)?;
    order_state::check_admin_transition(from, to)?;
    let (order, refunded) = order_service::apply_transition(&txn, existing, to).await?;

    txn.commit().await?;

    tracing::info!(order_id = order.id, from = %from, to = %to, refunded, "order status changed");
    audit::record(
        state,
        Some(order.user_id),
        "order_status_update",
        "orders",
        serde_json::json!({
            "order_id": order.id,
            "from": from.as_str(),
            "to": to.as_str(),
            "refunded": refunded,
            "actor": admin.subject,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order updated",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    _admin: &AdminUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let threshold = query.threshold.unwrap_or(5);
    let (page, limit, offset) = query.pagination.normalize();

    let finder = Products::find()
        .filter(
            Condition::all()
                .add(ProdCol::Stock.lte(threshold))
                .add(ProdCol::Deleted.eq(false)),
        )
        .order_by_asc(ProdCol::Stock)
        .order_by_desc(ProdCol::CreatedAt);

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
    Ok(ApiResponse::success(
        "Low stock",
        ProductList { items },
        Some(meta),
    ))
}

pub async fn adjust_inventory(
    state: &AppState,
    admin: &AdminUser,
    id: i64,
    payload: InventoryAdjustRequest,
) -> AppResult<ApiResponse<Product>> {
    if payload.delta == 0 {
        return Err(AppError::BadRequest("delta must not be 0".into()));
    }

    let txn = state.orm.begin().await?;
    let product = Products::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let new_stock = product.stock + payload.delta;
    if new_stock < 0 {
        return Err(AppError::BadRequest("stock cannot be negative".into()));
    }

    let mut active: ProductActive = product.into();
    active.stock = Set(new_stock);
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        state,
        None,
        "inventory_adjust",
        "products",
        serde_json::json!({ "product_id": updated.id, "delta": payload.delta, "actor": admin.subject }),
    )
    .await;

    Ok(ApiResponse::success(
        "Inventory updated",
        Product::from(updated),
        Some(Meta::empty()),
    ))
}

pub async fn list_users(
    state: &AppState,
    _admin: &AdminUser,
    query: UserListQuery,
) -> AppResult<ApiResponse<UserList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(UserCol::Name).ilike(pattern.clone()))
                .add(Expr::col(UserCol::Email).ilike(pattern)),
        );
    }

    let finder = Users::find()
        .filter(condition)
        .order_by_desc(UserCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn block_user(
    state: &AppState,
    admin: &AdminUser,
    id: i64,
) -> AppResult<ApiResponse<User>> {
    set_blocked(state, admin, id, true).await
}

pub async fn unblock_user(
    state: &AppState,
    admin: &AdminUser,
    id: i64,
) -> AppResult<ApiResponse<User>> {
    set_blocked(state, admin, id, false).await
}

async fn set_blocked(
    state: &AppState,
    admin: &AdminUser,
    id: i64,
    blocked: bool,
) -> AppResult<ApiResponse<User>> {
    let user = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if user.blocked == blocked {
        let state_name = if blocked { "blocked" } else { "active" };
        return Err(AppError::Conflict(format!("user is already {state_name}")));
    }

    let mut active: UserActive = user.into();
    active.blocked = Set(blocked);
    let user = active.update(&state.orm).await?;

    audit::record(
        state,
        Some(user.id),
        if blocked { "user_block" } else { "user_unblock" },
        "users",
        serde_json::json!({ "user_id": user.id, "actor": admin.subject }),
    )
    .await;

    Ok(ApiResponse::success(
        if blocked { "User blocked" } else { "User unblocked" },
        User::from(user),
        Some(Meta::empty()),
    ))
}
