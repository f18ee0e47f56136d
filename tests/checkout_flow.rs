mod common;

use chrono::{Duration, Utc};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use storefront_api::{
    dto::{
        offers::CreateOfferRequest,
        orders::{PaymentCallbackQuery, PlaceOrderQuery},
        products::InventoryAdjustRequest,
    },
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        coupons::Entity as Coupons,
        orders::Entity as Orders,
        users::Entity as Users,
        wallet_transactions::{Column as TxnCol, Entity as WalletTxns},
    },
    error::{AppError, CheckoutError},
    middleware::auth::AuthUser,
    pricing::CouponRejection,
    services::{admin_service, offer_service, order_service, payment_service},
    state::AppState,
};

async fn cart_lines(state: &AppState, user: &AuthUser) -> anyhow::Result<u64> {
    Ok(CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .count(&state.orm)
        .await?)
}

fn query(address_id: i64, coupon: Option<&str>, method: &str) -> PlaceOrderQuery {
    PlaceOrderQuery {
        address_id,
        coupon_code: coupon.map(str::to_string),
        payment_method: method.to_string(),
    }
}

// One database, several checkouts: pricing, rollback on failure, coupon and
// payment-method rules, and the gateway round trip.
#[tokio::test]
async fn checkout_keeps_stock_coupons_cart_and_wallet_consistent() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let admin = common::admin();

    let user = common::create_user(&state, "buyer@example.com", "9000000001", 50_000).await?;
    let address_id = common::create_address(&state, &user).await?;
    let widget = common::create_product(&state, "Widget", 10_000, 5).await?;
    let gadget = common::create_product(&state, "Gadget", 3_000, 1).await?;
    let console = common::create_product(&state, "Console", 200_000, 2).await?;
    let coupon = common::create_coupon(&state, "SAVE10", 10, 1_500, 5_000, 1).await?;

    offer_service::add_offer(
        &state,
        &admin,
        CreateOfferRequest {
            product_id: widget.id,
            discount_percentage: 10,
            starts_at: Utc::now() - Duration::hours(1),
            ends_at: Utc::now() + Duration::days(1),
        },
    )
    .await?;

    // Empty cart.
    let err = order_service::place_order(&state, &user, query(address_id, None, "cod"))
        .await
        .expect_err("empty cart must be rejected");
    assert!(matches!(err, AppError::Checkout(CheckoutError::EmptyCart)));

    // Someone else's address.
    let other = common::create_user(&state, "other@example.com", "9000000002", 0).await?;
    let other_address = common::create_address(&state, &other).await?;
    common::add_to_cart(&state, &user, widget.id, 2).await?;
    let err = order_service::place_order(&state, &user, query(other_address, None, "cod"))
        .await
        .expect_err("foreign address must be rejected");
    assert!(matches!(err, AppError::Checkout(CheckoutError::AddressNotFound)));

    // Wallet purchase with offer and coupon.
    let placed = order_service::place_order(
        &state,
        &user,
        query(address_id, Some("save10"), "wallet"),
    )
    .await?
    .data
    .expect("placed order");
    let order = placed.order;
    assert_eq!(order.offer_discount, 2_000);
    assert_eq!(order.coupon_discount, 1_500);
    assert_eq!(order.total_amount, 16_500);
    assert_eq!(order.coupon_code.as_deref(), Some("SAVE10"));
    assert_eq!(order.status, "Pending");
    assert_eq!(order.payment_status, "Paid");
    assert!(order.reference_id.starts_with("ORD-"));
    assert_eq!(placed.items.len(), 1);
    assert_eq!(placed.items[0].subtotal, 20_000);
    assert!(placed.approval_url.is_none());

    assert_eq!(common::stock_of(&state, widget.id).await?, 3);
    assert_eq!(cart_lines(&state, &user).await?, 0);
    let redeemed = Coupons::find_by_id(coupon.id).one(&state.orm).await?.expect("coupon");
    assert_eq!(redeemed.used_count, 1);
    let account = Users::find_by_id(user.user_id).one(&state.orm).await?.expect("user");
    assert_eq!(account.wallet_balance, 33_500);
    let debits = WalletTxns::find()
        .filter(TxnCol::OrderId.eq(order.id))
        .count(&state.orm)
        .await?;
    assert_eq!(debits, 1);

    // The coupon is used up: nothing changes.
    common::add_to_cart(&state, &user, widget.id, 1).await?;
    let err = order_service::place_order(
        &state,
        &user,
        query(address_id, Some("SAVE10"), "wallet"),
    )
    .await
    .expect_err("exhausted coupon must be rejected");
    assert!(matches!(
        err,
        AppError::Checkout(CheckoutError::InvalidCoupon(
            CouponRejection::UsageLimitReached
        ))
    ));
    assert_eq!(common::stock_of(&state, widget.id).await?, 3);
    assert_eq!(cart_lines(&state, &user).await?, 1);

    // A line that went out of stock after it was carted rolls everything back.
    common::add_to_cart(&state, &user, gadget.id, 1).await?;
    admin_service::adjust_inventory(&state, &admin, gadget.id, InventoryAdjustRequest { delta: -1 })
        .await?;
    let err = order_service::place_order(&state, &user, query(address_id, None, "cod"))
        .await
        .expect_err("out of stock line must be rejected");
    assert!(matches!(
        err,
        AppError::Checkout(CheckoutError::InsufficientStock { product_id }) if product_id == gadget.id
    ));
    assert_eq!(common::stock_of(&state, widget.id).await?, 3);
    assert_eq!(cart_lines(&state, &user).await?, 2);
    assert_eq!(Orders::find().count(&state.orm).await?, 1);

    // Cash on delivery above the limit.
    storefront_api::services::cart_service::clear_cart(&state, &user).await?;
    common::add_to_cart(&state, &user, console.id, 1).await?;
    let err = order_service::place_order(&state, &user, query(address_id, None, "cod"))
        .await
        .expect_err("cod over the limit must be rejected");
    assert!(matches!(
        err,
        AppError::Checkout(CheckoutError::CodLimitExceeded { limit }) if limit == common::COD_LIMIT
    ));
    assert_eq!(common::stock_of(&state, console.id).await?, 2);
    assert_eq!(Orders::find().count(&state.orm).await?, 1);

    // Cash on delivery ignores coupons.
    let free = common::create_coupon(&state, "FREE5", 5, 10_000, 0, 10).await?;
    storefront_api::services::cart_service::clear_cart(&state, &user).await?;
    common::add_to_cart(&state, &user, widget.id, 1).await?;
    let cod = order_service::place_order(&state, &user, query(address_id, Some("FREE5"), "COD"))
        .await?
        .data
        .expect("cod order")
        .order;
    assert_eq!(cod.coupon_discount, 0);
    assert!(cod.coupon_code.is_none());
    assert_eq!(cod.total_amount, 9_000);
    assert_eq!(cod.status, "Pending COD Verification");
    assert_eq!(cod.payment_status, "Pending");
    let untouched = Coupons::find_by_id(free.id).one(&state.orm).await?.expect("coupon");
    assert_eq!(untouched.used_count, 0);

    // Gateway: the order waits in Processing until the callback captures it.
    common::add_to_cart(&state, &user, widget.id, 1).await?;
    let placed = order_service::place_order(&state, &user, query(address_id, None, "paypal"))
        .await?
        .data
        .expect("gateway order");
    assert_eq!(placed.order.payment_status, "Processing");
    let approval = placed.approval_url.expect("approval url");
    assert!(approval.contains(&placed.order.reference_id));

    let callback = || PaymentCallbackQuery {
        token: Some(format!("PAY-{}", placed.order.reference_id)),
        payer_id: Some("PAYER-1".into()),
    };
    let paid = payment_service::complete_gateway_payment(&state, callback())
        .await?
        .data
        .expect("captured order");
    assert_eq!(paid.payment_status, "Completed");
    assert!(paid.paid_at.is_some());
    assert_eq!(common::stock_of(&state, widget.id).await?, 1);

    let err = payment_service::complete_gateway_payment(&state, callback())
        .await
        .expect_err("second capture must be rejected");
    assert!(matches!(err, AppError::Conflict(_)));

    let err = payment_service::complete_gateway_payment(
        &state,
        PaymentCallbackQuery {
            token: Some("PAY-x".into()),
            payer_id: None,
        },
    )
    .await
    .expect_err("missing payer id must be rejected");
    assert!(matches!(err, AppError::BadRequest(_)));

    Ok(())
}
