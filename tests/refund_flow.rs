mod common;

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use storefront_api::{
    dto::orders::{PlaceOrderQuery, UpdateOrderStatusRequest},
    entity::{
        audit_logs::{Column as AuditCol, Entity as AuditLogs},
        orders::Entity as Orders,
        wallet_transactions::{Column as TxnCol, Entity as WalletTxns},
    },
    error::{AppError, CheckoutError},
    middleware::auth::AuthUser,
    order_state::TransitionError,
    routes::params::Pagination,
    services::{admin_service, cart_service, order_service, wallet_service},
    state::AppState,
};

async fn refunds_for(state: &AppState, order_id: i64) -> anyhow::Result<u64> {
    Ok(WalletTxns::find()
        .filter(TxnCol::OrderId.eq(order_id))
        .filter(TxnCol::TransactionType.eq("Refund"))
        .count(&state.orm)
        .await?)
}

async fn balance(state: &AppState, user: &AuthUser) -> anyhow::Result<i64> {
    let wallet = wallet_service::view_wallet(state, user)
        .await?
        .data
        .expect("wallet");
    assert!(wallet.consistent, "balance {} vs ledger {}", wallet.balance, wallet.ledger_balance);
    Ok(wallet.balance)
}

fn status(value: &str) -> UpdateOrderStatusRequest {
    UpdateOrderStatusRequest {
        status: value.to_string(),
    }
}

// Refunds are credited once per order and the cached wallet balance always
// matches the ledger.
#[tokio::test]
async fn refunds_credit_the_wallet_exactly_once() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let admin = common::admin();

    let user = common::create_user(&state, "refund@example.com", "9000000011", 0).await?;
    let address_id = common::create_address(&state, &user).await?;
    let widget = common::create_product(&state, "Refund Widget", 5_000, 10).await?;

    // Cash order delivered then returned: the collected cash lands in the wallet.
    common::add_to_cart(&state, &user, widget.id, 2).await?;
    let cod = order_service::place_order(
        &state,
        &user,
        PlaceOrderQuery {
            address_id,
            coupon_code: None,
            payment_method: "cod".into(),
        },
    )
    .await?
    .data
    .expect("cod order")
    .order;

    let delivered = admin_service::update_order_status(&state, &admin, cod.id, status("Delivered"))
        .await?
        .data
        .expect("delivered");
    assert_eq!(delivered.payment_status, "Paid");

    admin_service::update_order_status(&state, &admin, cod.id, status("Returned")).await?;
    assert_eq!(balance(&state, &user).await?, 10_000);
    assert_eq!(refunds_for(&state, cod.id).await?, 1);
    assert_eq!(common::stock_of(&state, widget.id).await?, 8, "returns are not restocked");

    let err = admin_service::update_order_status(&state, &admin, cod.id, status("Returned"))
        .await
        .expect_err("second return must be rejected");
    assert!(matches!(
        err,
        AppError::Transition(TransitionError::AlreadyInStatus(_))
    ));
    assert_eq!(refunds_for(&state, cod.id).await?, 1);

    // Pay from the wallet.
    let wallet_query = || PlaceOrderQuery {
        address_id,
        coupon_code: None,
        payment_method: "wallet".into(),
    };
    common::add_to_cart(&state, &user, widget.id, 1).await?;
    let paid = order_service::place_order(&state, &user, wallet_query())
        .await?
        .data
        .expect("wallet order")
        .order;
    assert_eq!(balance(&state, &user).await?, 5_000);
    assert_eq!(common::stock_of(&state, widget.id).await?, 7);

    // Not enough left for the next one.
    common::add_to_cart(&state, &user, widget.id, 2).await?;
    let err = order_service::place_order(&state, &user, wallet_query())
        .await
        .expect_err("insufficient balance must be rejected");
    assert!(matches!(
        err,
        AppError::Checkout(CheckoutError::InsufficientWalletBalance)
    ));
    assert_eq!(balance(&state, &user).await?, 5_000);
    assert_eq!(common::stock_of(&state, widget.id).await?, 7);
    assert_eq!(Orders::find().count(&state.orm).await?, 2);

    // Owner cancels: stock comes back and the total is refunded once.
    let cancelled = order_service::cancel_order(&state, &user, paid.id)
        .await?
        .data
        .expect("cancelled");
    assert_eq!(cancelled.status, "Cancelled");
    assert_eq!(common::stock_of(&state, widget.id).await?, 8);
    assert_eq!(balance(&state, &user).await?, 10_000);

    let err = order_service::cancel_order(&state, &user, paid.id)
        .await
        .expect_err("second cancel must be rejected");
    assert!(matches!(
        err,
        AppError::Transition(TransitionError::AlreadyInStatus(_))
    ));

    // Cancelled may still be marked Returned, but it is not refunded twice.
    admin_service::update_order_status(&state, &admin, paid.id, status("Returned")).await?;
    assert_eq!(refunds_for(&state, paid.id).await?, 1);
    assert_eq!(balance(&state, &user).await?, 10_000);
    assert_eq!(common::stock_of(&state, widget.id).await?, 8, "restocked only once");

    let ledger = wallet_service::list_transactions(
        &state,
        &user,
        Pagination {
            page: Some(1),
            per_page: Some(20),
        },
    )
    .await?
    .data
    .expect("ledger");
    assert_eq!(ledger.items.len(), 3);

    let status_changes = AuditLogs::find()
        .filter(AuditCol::Action.eq("order_status_update"))
        .filter(AuditCol::UserId.eq(user.user_id))
        .count(&state.orm)
        .await?;
    assert!(status_changes >= 1);

    // Returned before it ever shipped: the reserved unit goes back on the shelf.
    cart_service::clear_cart(&state, &user).await?;
    common::add_to_cart(&state, &user, widget.id, 1).await?;
    let unshipped = order_service::place_order(
        &state,
        &user,
        PlaceOrderQuery {
            address_id,
            coupon_code: None,
            payment_method: "cod".into(),
        },
    )
    .await?
    .data
    .expect("cod order")
    .order;
    assert_eq!(common::stock_of(&state, widget.id).await?, 7);

    admin_service::update_order_status(&state, &admin, unshipped.id, status("Returned")).await?;
    assert_eq!(common::stock_of(&state, widget.id).await?, 8);
    assert_eq!(refunds_for(&state, unshipped.id).await?, 0);
    assert_eq!(balance(&state, &user).await?, 10_000);

    Ok(())
}
