pub mod addresses;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod coupons;
pub mod offers;
pub mod orders;
pub mod products;
pub mod reports;
pub mod users;
pub mod wallet;
pub mod wishlist;
