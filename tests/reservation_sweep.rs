mod common;

use chrono::{Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use storefront_api::{
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        wallet_transactions::{Column as TxnCol, Entity as WalletTxns},
    },
    error::AppError,
    services::{order_service, payment_service},
};

// Unpaid gateway orders give their stock back once the reservation lapses,
// and money captured for them afterwards goes to the wallet.
#[tokio::test]
async fn stale_gateway_orders_are_expired() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let user = common::create_user(&state, "slow@example.com", "9000000021", 0).await?;
    let address_id = common::create_address(&state, &user).await?;
    let widget = common::create_product(&state, "Reserved Widget", 5_000, 3).await?;

    common::add_to_cart(&state, &user, widget.id, 2).await?;
    let order = order_service::place_order(&state, &user, common::gateway_query(address_id))
        .await?
        .data
        .expect("gateway order")
        .order;
    assert_eq!(common::stock_of(&state, widget.id).await?, 1);

    assert_eq!(order_service::expire_stale_gateway_orders(&state).await?, 0);

    let lapsed = Utc::now() - Duration::minutes(state.config.reservation_ttl_minutes + 1);
    Orders::update_many()
        .col_expr(OrderCol::CreatedAt, Expr::value(lapsed))
        .filter(OrderCol::Id.eq(order.id))
        .exec(&state.orm)
        .await?;

    assert_eq!(order_service::expire_stale_gateway_orders(&state).await?, 1);
    let expired = Orders::find_by_id(order.id)
        .one(&state.orm)
        .await?
        .expect("order");
    assert_eq!(expired.status, "Cancelled");
    assert_eq!(expired.payment_status, "Processing");
    assert_eq!(common::stock_of(&state, widget.id).await?, 3);
    let refunds = WalletTxns::find()
        .filter(TxnCol::OrderId.eq(order.id))
        .count(&state.orm)
        .await?;
    assert_eq!(refunds, 0);

    // The buyer pays after all: captured, then credited back.
    let captured = payment_service::complete_gateway_payment(&state, common::callback_for(&order))
        .await?
        .data
        .expect("captured order");
    assert_eq!(captured.status, "Cancelled");
    assert_eq!(captured.payment_status, "Completed");
    assert_eq!(common::refund_rows(&state, order.id).await?, 1);
    assert_eq!(common::balance(&state, &user).await?, order.total_amount);
    assert_eq!(common::stock_of(&state, widget.id).await?, 3);

    let err = payment_service::complete_gateway_payment(&state, common::callback_for(&order))
        .await
        .expect_err("repeated callback must be rejected");
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(common::refund_rows(&state, order.id).await?, 1);
    assert_eq!(common::balance(&state, &user).await?, order.total_amount);

    Ok(())
}
