mod common;

use storefront_api::{dto::cart::AddToCartRequest, error::AppError, services::cart_service};

fn add(product_id: i64, quantity: i32) -> AddToCartRequest {
    AddToCartRequest {
        product_id,
        quantity,
    }
}

// Repeat adds accumulate up to the per-product cap and the live stock.
#[tokio::test]
async fn cart_quantities_are_bounded() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let user = common::create_user(&state, "cart@example.com", "9000000031", 0).await?;
    let plenty = common::create_product(&state, "Plenty Widget", 1_000, 50).await?;
    let scarce = common::create_product(&state, "Scarce Widget", 1_000, 3).await?;

    common::add_to_cart(&state, &user, plenty.id, 4).await?;
    let line = cart_service::add_to_cart(&state, &user, add(plenty.id, 2))
        .await?
        .data
        .expect("cart line");
    assert_eq!(line.quantity, 6);

    let err = cart_service::add_to_cart(&state, &user, add(plenty.id, i32::MAX))
        .await
        .expect_err("overflowing quantity must be rejected");
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = cart_service::add_to_cart(&state, &user, add(plenty.id, 5))
        .await
        .expect_err("per-product cap must hold");
    assert!(matches!(err, AppError::Conflict(_)));

    let err = cart_service::add_to_cart(&state, &user, add(scarce.id, 4))
        .await
        .expect_err("cannot hold more than is in stock");
    assert!(matches!(err, AppError::Conflict(_)));

    let err = cart_service::add_to_cart(&state, &user, add(plenty.id, 0))
        .await
        .expect_err("zero quantity must be rejected");
    assert!(matches!(err, AppError::BadRequest(_)));

    let cart = cart_service::view_cart(&state, &user)
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.total, 6_000);

    Ok(())
}
