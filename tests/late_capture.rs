mod common;

use storefront_api::{
    dto::orders::UpdateOrderStatusRequest,
    services::{admin_service, order_service, payment_service},
};

// An unpaid order marked Returned before it shipped restocks, and a late
// capture for it is refunded.
#[tokio::test]
async fn capture_after_return_is_refunded() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let admin = common::admin();

    let user = common::create_user(&state, "late@example.com", "9000000022", 0).await?;
    let address_id = common::create_address(&state, &user).await?;
    let widget = common::create_product(&state, "Returned Widget", 4_000, 10).await?;

    common::add_to_cart(&state, &user, widget.id, 1).await?;
    let order = order_service::place_order(&state, &user, common::gateway_query(address_id))
        .await?
        .data
        .expect("gateway order")
        .order;
    assert_eq!(common::stock_of(&state, widget.id).await?, 9);

    let returned = admin_service::update_order_status(
        &state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: "Returned".into(),
        },
    )
    .await?
    .data
    .expect("returned order");
    assert_eq!(returned.payment_status, "Processing");
    assert_eq!(common::stock_of(&state, widget.id).await?, 10);
    assert_eq!(common::refund_rows(&state, order.id).await?, 0);

    let captured = payment_service::complete_gateway_payment(&state, common::callback_for(&order))
        .await?
        .data
        .expect("captured order");
    assert_eq!(captured.status, "Returned");
    assert_eq!(captured.payment_status, "Completed");
    assert_eq!(common::refund_rows(&state, order.id).await?, 1);
    assert_eq!(common::balance(&state, &user).await?, 4_000);
    assert_eq!(common::stock_of(&state, widget.id).await?, 10);

    Ok(())
}
