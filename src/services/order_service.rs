//! Order placement and the order lifecycle.
//!
//! Checkout runs as one database transaction: the cart is read, the
//! products are locked and their stock reserved, the order and its lines
//! are written, the wallet is debited and the coupon redeemed. Any error
//! drops the transaction, which rolls everything back. Only the gateway
//! call for online payments happens after commit.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::{
    audit,
    dto::orders::{OrderList, OrderWithItems, PlaceOrderQuery, PlacedOrder},
    entity::{
        addresses::{Column as AddressCol, Entity as Addresses},
        cart_items::{Column as CartCol, Entity as CartItems},
        coupons::{Column as CouponCol, Entity as Coupons},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult, CheckoutError},
    gateway::{GatewayOrderRequest, gateway_amount},
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    order_state::{self, OrderStatus, PaymentMethod, PaymentStatus},
    pricing::{self, CouponRejection, PricedLine},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::{coupon_service, offer_service, wallet_service},
    state::AppState,
};

/// Where a checkout got to; logged when it aborts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStage {
    Validating,
    StockChecked,
    Priced,
    Persisted,
    PaymentRouted,
}

impl fmt::Display for CheckoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckoutStage::Validating => "validating",
            CheckoutStage::StockChecked => "stock_checked",
            CheckoutStage::Priced => "priced",
            CheckoutStage::Persisted => "persisted",
            CheckoutStage::PaymentRouted => "payment_routed",
        };
        f.write_str(name)
    }
}

struct StageTracker {
    user_id: i64,
    stage: CheckoutStage,
}

impl StageTracker {
    fn advance(&mut self, next: CheckoutStage) {
        tracing::debug!(user_id = self.user_id, from = %self.stage, to = %next, "checkout stage");
        self.stage = next;
    }
}

static LAST_REFERENCE: AtomicI64 = AtomicI64::new(0);

/// Order reference ids are `ORD-` plus a nanosecond timestamp, bumped when
/// needed so that ids issued by this process strictly increase.
pub fn next_reference_id() -> String {
    let now = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros() * 1_000);
    let mut prev = LAST_REFERENCE.load(Ordering::Relaxed);
    loop {
        let next = now.max(prev + 1);
        match LAST_REFERENCE.compare_exchange_weak(prev, next, Ordering::SeqCst, Ordering::Relaxed)
        {
            Ok(_) => return format!("ORD-{next}"),
            Err(actual) => prev = actual,
        }
    }
}

pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    query: PlaceOrderQuery,
) -> AppResult<ApiResponse<PlacedOrder>> {
    if query.payment_method.trim().is_empty() {
        return Err(AppError::BadRequest("payment method is required".into()));
    }
    let method = PaymentMethod::parse(&query.payment_method);
    let coupon_code = query
        .coupon_code
        .map(|code| code.trim().to_uppercase())
        .filter(|code| !code.is_empty());

    let mut tracker = StageTracker {
        user_id: user.user_id,
        stage: CheckoutStage::Validating,
    };
    let placed = match checkout(state, user, query.address_id, coupon_code, &method, &mut tracker)
        .await
    {
        Ok(placed) => placed,
        Err(err) => {
            tracing::warn!(
                user_id = user.user_id,
                stage = %tracker.stage,
                error = %err,
                "checkout aborted"
            );
            return Err(err);
        }
    };
    let (order, items) = placed;

    tracing::info!(
        user_id = user.user_id,
        order_id = order.id,
        reference_id = %order.reference_id,
        total = order.total_amount,
        payment_method = %order.payment_method,
        "order placed"
    );
    audit::record(
        state,
        Some(user.user_id),
        "checkout",
        "orders",
        serde_json::json!({
            "order_id": order.id,
            "reference_id": order.reference_id,
            "total": order.total_amount,
        }),
    )
    .await;

    let approval_url = match method {
        PaymentMethod::Gateway => Some(start_gateway_payment(state, &order).await?),
        _ => None,
    };

    Ok(ApiResponse::success(
        "Order placed",
        PlacedOrder {
            order: Order::from(order),
            items: items.into_iter().map(OrderItem::from).collect(),
            approval_url,
        },
        Some(Meta::empty()),
    ))
}

async fn checkout(
    state: &AppState,
    user: &AuthUser,
    address_id: i64,
    coupon_code: Option<String>,
    method: &PaymentMethod,
    tracker: &mut StageTracker,
) -> AppResult<(OrderModel, Vec<OrderItemModel>)> {
    let address = Addresses::find()
        .filter(
            Condition::all()
                .add(AddressCol::Id.eq(address_id))
                .add(AddressCol::UserId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(CheckoutError::AddressNotFound)?;

    let txn = state.orm.begin().await?;
    let now = Utc::now();

    let cart = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::ProductId)
        .all(&txn)
        .await?;
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart.into());
    }

    // Locked in id order so concurrent checkouts cannot deadlock.
    let product_ids: Vec<i64> = cart.iter().map(|line| line.product_id).collect();
    let products: HashMap<i64, _> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .order_by_asc(ProdCol::Id)
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    let mut lines = Vec::with_capacity(cart.len());
    for line in &cart {
        let product = products
            .get(&line.product_id)
            .filter(|product| !product.deleted && product.stock >= line.quantity)
            .ok_or(CheckoutError::InsufficientStock {
                product_id: line.product_id,
            })?;
        lines.push(PricedLine {
            product_id: product.id,
            quantity: line.quantity,
            unit_price: product.price,
            offer_percentage: None,
        });
    }
    tracker.advance(CheckoutStage::StockChecked);

    for line in &mut lines {
        line.offer_percentage = offer_service::active_percentage(&txn, line.product_id, now).await?;
    }

    let coupon = match (&coupon_code, method.redeems_coupons()) {
        (Some(code), true) => Some(
            Coupons::find()
                .filter(CouponCol::Code.eq(code.as_str()))
                .lock(LockType::Update)
                .one(&txn)
                .await?
                .ok_or(CheckoutError::InvalidCoupon(CouponRejection::NotFound))?,
        ),
        (Some(code), false) => {
            tracing::debug!(code = %code, "coupon ignored for cash on delivery");
            None
        }
        (None, _) => None,
    };
    let terms = coupon.as_ref().map(coupon_service::terms);
    let quote = pricing::quote(&lines, terms.as_ref(), now).map_err(CheckoutError::from)?;
    tracker.advance(CheckoutStage::Priced);

    if *method == PaymentMethod::Cod && quote.total > state.config.cod_limit {
        return Err(CheckoutError::CodLimitExceeded {
            limit: state.config.cod_limit,
        }
        .into());
    }

    let (status, payment_status) = method.initial_statuses();
    let order = OrderActive {
        id: NotSet,
        reference_id: Set(next_reference_id()),
        user_id: Set(user.user_id),
        total_amount: Set(quote.total),
        coupon_discount: Set(quote.coupon_discount),
        offer_discount: Set(quote.offer_discount),
        coupon_code: Set(coupon.as_ref().map(|c| c.code.clone())),
        payment_method: Set(method.as_str().to_string()),
        payment_status: Set(payment_status.as_str().to_string()),
        status: Set(status.as_str().to_string()),
        address_line: Set(address.address_line),
        city: Set(address.city),
        zip_code: Set(address.zip_code),
        gateway_order_id: Set(None),
        paid_at: Set(payment_status.is_settled().then(|| now.into())),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for line in &lines {
        let item = OrderItemActive {
            id: NotSet,
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            price: Set(line.unit_price),
            subtotal: Set(line.subtotal()),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;
        items.push(item);

        let reserved = Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(line.quantity))
            .filter(
                Condition::all()
                    .add(ProdCol::Id.eq(line.product_id))
                    .add(ProdCol::Stock.gte(line.quantity)),
            )
            .exec(&txn)
            .await?;
        if reserved.rows_affected == 0 {
            return Err(CheckoutError::InsufficientStock {
                product_id: line.product_id,
            }
            .into());
        }
    }
    tracker.advance(CheckoutStage::Persisted);

    if *method == PaymentMethod::Wallet {
        wallet_service::debit_for_order(&txn, user.user_id, order.id, order.total_amount).await?;
    }

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    if let Some(coupon) = &coupon {
        let redeemed = Coupons::update_many()
            .col_expr(CouponCol::UsedCount, Expr::col(CouponCol::UsedCount).add(1))
            .filter(
                Condition::all()
                    .add(CouponCol::Id.eq(coupon.id))
                    .add(Expr::col(CouponCol::UsedCount).lt(Expr::col(CouponCol::UsageLimit))),
            )
            .exec(&txn)
            .await?;
        if redeemed.rows_affected == 0 {
            return Err(CheckoutError::InvalidCoupon(CouponRejection::UsageLimitReached).into());
        }
    }
    tracker.advance(CheckoutStage::PaymentRouted);

    txn.commit().await?;
    Ok((order, items))
}

/// Creates the gateway order for a committed checkout. The order is not
/// rolled back when this fails; it stays Processing until the callback
/// arrives or the reservation sweeper cancels it.
async fn start_gateway_payment(state: &AppState, order: &OrderModel) -> AppResult<String> {
    let request = GatewayOrderRequest {
        reference_id: order.reference_id.clone(),
        amount: gateway_amount(order.total_amount, state.config.paypal.exchange_rate),
        currency: state.config.paypal.currency.clone(),
    };

    let created = match state.gateway.create_order(request).await {
        Ok(created) => created,
        Err(err) => {
            tracing::error!(
                order_id = order.id,
                reference_id = %order.reference_id,
                error = %err,
                "gateway order creation failed after commit"
            );
            return Err(err.into());
        }
    };

    let saved = Orders::update_many()
        .col_expr(OrderCol::GatewayOrderId, Expr::value(created.id.clone()))
        .filter(OrderCol::Id.eq(order.id))
        .exec(&state.orm)
        .await;
    if let Err(err) = saved {
        tracing::warn!(order_id = order.id, error = %err, "failed to store gateway order id");
    }

    Ok(created.approval_url)
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
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
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let data = with_items(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let from = OrderStatus::parse(&order.status)?;
    order_state::check_user_cancel(from)?;
    let (order, refunded) = apply_transition(&txn, order, OrderStatus::Cancelled).await?;

    txn.commit().await?;

    audit::record(
        state,
        Some(user.user_id),
        "order_cancel",
        "orders",
        serde_json::json!({ "order_id": order.id, "from": from.as_str(), "refunded": refunded }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order cancelled",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

/// Writes an already-validated status change and its side effects:
/// cancelling, or returning an order that never shipped, releases reserved
/// stock, a cash order marked Delivered is
/// paid, and entering Cancelled or Returned with money collected credits
/// the total to the wallet. Returns the updated order and whether a refund
/// was credited.
pub async fn apply_transition<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
    to: OrderStatus,
) -> AppResult<(OrderModel, bool)> {
    let mut payment = PaymentStatus::parse(&order.payment_status).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "order {} has unknown payment status {:?}",
            order.id,
            order.payment_status
        ))
    })?;
    let from = OrderStatus::parse(&order.status)?;
    let cash_collected = to == OrderStatus::Delivered
        && PaymentMethod::parse(&order.payment_method) == PaymentMethod::Cod
        && payment == PaymentStatus::Pending;

    let now = Utc::now();
    let mut active: OrderActive = order.into();
    active.status = Set(to.as_str().to_string());
    active.updated_at = Set(now.into());
    if cash_collected {
        payment = PaymentStatus::Paid;
        active.payment_status = Set(payment.as_str().to_string());
        active.paid_at = Set(Some(now.into()));
    }
    let order = active.update(conn).await?;

    if order_state::releases_stock(from, to) {
        release_stock(conn, order.id).await?;
    }

    let refunded = if order_state::refund_due(to, payment) {
        wallet_service::credit_refund(conn, order.user_id, order.id, order.total_amount).await?
    } else {
        false
    };

    Ok((order, refunded))
}

async fn release_stock<C: ConnectionTrait>(conn: &C, order_id: i64) -> AppResult<()> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::ProductId)
        .all(conn)
        .await?;
    for item in items {
        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(item.quantity))
            .filter(ProdCol::Id.eq(item.product_id))
            .exec(conn)
            .await?;
    }
    Ok(())
}

pub async fn with_items<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
) -> AppResult<OrderWithItems> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    Ok(OrderWithItems {
        order: Order::from(order),
        items,
    })
}

/// Cancels gateway orders whose payment never arrived, releasing the stock
/// they reserved. Returns how many were cancelled.
pub async fn expire_stale_gateway_orders(state: &AppState) -> AppResult<u64> {
    let cutoff: DateTime<Utc> =
        Utc::now() - Duration::minutes(state.config.reservation_ttl_minutes);
    let stale = stale_gateway_filter(cutoff);

    let ids: Vec<i64> = Orders::find()
        .select_only()
        .column(OrderCol::Id)
        .filter(stale.clone())
        .into_tuple()
        .all(&state.orm)
        .await?;

    let mut cancelled = 0;
    for id in ids {
        let txn = state.orm.begin().await?;
        // Re-checked under the lock; the callback may have won the race.
        let Some(order) = Orders::find_by_id(id)
            .filter(stale.clone())
            .lock(LockType::Update)
            .one(&txn)
            .await?
        else {
            continue;
        };
        apply_transition(&txn, order, OrderStatus::Cancelled).await?;
        txn.commit().await?;
        cancelled += 1;

        audit::record(
            state,
            None,
            "order_expired",
            "orders",
            serde_json::json!({ "order_id": id }),
        )
        .await;
    }

    if cancelled > 0 {
        tracing::info!(cancelled, "expired unpaid gateway orders");
    }
    Ok(cancelled)
}

fn stale_gateway_filter(cutoff: DateTime<Utc>) -> Condition {
    Condition::all()
        .add(OrderCol::PaymentMethod.eq(PaymentMethod::Gateway.as_str()))
        .add(OrderCol::PaymentStatus.eq(PaymentStatus::Processing.as_str()))
        .add(OrderCol::Status.eq(OrderStatus::Pending.as_str()))
        .add(OrderCol::CreatedAt.lt(cutoff))
}
