use axum::Router;

use crate::state::AppState;

pub mod addresses;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod coupons;
pub mod doc;
pub mod health;
pub mod offers;
pub mod orders;
pub mod params;
pub mod payments;
pub mod products;
pub mod profile;
pub mod reports;
pub mod wallet;
pub mod wishlist;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    let admin = admin::router()
        .nest("/products", products::admin_router())
        .nest("/categories", categories::admin_router())
        .nest("/coupons", coupons::admin_router())
        .nest("/offers", offers::admin_router())
        .nest("/reports", reports::admin_router());

    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .nest("/categories", categories::router())
        .nest("/cart", cart::router())
        .nest("/profile", profile::router())
        .nest("/addresses", addresses::router())
        .nest("/wishlist", wishlist::router())
        .nest("/orders", orders::router())
        .nest("/wallet", wallet::router())
        .nest("/coupons", coupons::router())
        .nest("/payments", payments::router())
        .nest("/admin", admin)
}
