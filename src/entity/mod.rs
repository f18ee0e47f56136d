pub mod addresses;
pub mod admins;
pub mod audit_logs;
pub mod cart_items;
pub mod categories;
pub mod coupons;
pub mod offers;
pub mod order_items;
pub mod orders;
pub mod otp_codes;
pub mod products;
pub mod users;
pub mod wallet_transactions;
pub mod wishlists;

pub use addresses::Entity as Addresses;
pub use admins::Entity as Admins;
pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use categories::Entity as Categories;
pub use coupons::Entity as Coupons;
pub use offers::Entity as Offers;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use otp_codes::Entity as OtpCodes;
pub use products::Entity as Products;
pub use users::Entity as Users;
pub use wallet_transactions::Entity as WalletTransactions;
pub use wishlists::Entity as Wishlists;
