use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        addresses::{AddressList, AddressRequest},
        auth::{
            AdminLoginRequest, LoginRequest, LoginResponse, ResendOtpRequest, SignupRequest,
            VerifyOtpRequest,
        },
        cart::{AddToCartRequest, CartLine, CartView},
        categories::{CategoryList, CreateCategoryRequest},
        coupons::{ApplyCouponRequest, CouponList, CouponPreview, CreateCouponRequest},
        offers::{CreateOfferRequest, OfferList, OfferView},
        orders::{
            OrderList, OrderWithItems, PaymentCallbackQuery, PlaceOrderQuery, PlacedOrder,
            UpdateOrderStatusRequest, WalletPurchaseQuery,
        },
        products::{CreateProductRequest, InventoryAdjustRequest, ProductList, UpdateProductRequest},
        reports::{
            Dashboard, Period, ProductSales, RankedItem, SalesReport, StatusCounts, TopSelling,
        },
        users::{Profile, UpdateProfileRequest, UserList},
        wallet::{WalletTransactionList, WalletView},
        wishlist::{AddWishlistRequest, WishlistProductList},
    },
    models::{
        Address, CartItem, Category, Coupon, Offer, Order, OrderItem, Product, User,
        WalletTransaction,
    },
    response::{ApiResponse, Meta},
    routes::{
        addresses, admin, auth, cart, categories, coupons, health, offers, orders, params,
        payments, products, profile, reports, wallet, wishlist,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::readiness_check,
        auth::signup,
        auth::verify_otp,
        auth::resend_otp,
        auth::login,
        products::list_products,
        products::get_product,
        categories::list_categories,
        cart::view_cart,
        cart::add_to_cart,
        cart::remove_from_cart,
        cart::clear_cart,
        wishlist::list_wishlist,
        wishlist::add_to_wishlist,
        wishlist::remove_from_wishlist,
        wishlist::clear_wishlist,
        profile::show_profile,
        profile::update_profile,
        addresses::list_addresses,
        addresses::add_address,
        addresses::update_address,
        addresses::delete_address,
        orders::list_orders,
        orders::checkout,
        orders::wallet_purchase,
        orders::get_order,
        orders::cancel_order,
        wallet::view_wallet,
        wallet::list_transactions,
        coupons::list_coupons,
        coupons::apply_coupon,
        payments::paypal_success,
        payments::paypal_cancel,
        admin::admin_login,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_low_stock,
        admin::adjust_inventory,
        admin::list_users,
        admin::block_user,
        admin::unblock_user,
        products::list_products_admin,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::recover_product,
        categories::list_categories_admin,
        categories::create_category,
        categories::delete_category,
        categories::recover_category,
        coupons::list_coupons_admin,
        coupons::create_coupon,
        coupons::remove_coupon,
        offers::list_offers,
        offers::add_offer,
        offers::remove_offer,
        reports::sales_report,
        reports::dashboard,
        reports::top_selling
    ),
    components(
        schemas(
            User,
            Category,
            Product,
            Address,
            CartItem,
            Order,
            OrderItem,
            Coupon,
            Offer,
            WalletTransaction,
            SignupRequest,
            VerifyOtpRequest,
            ResendOtpRequest,
            LoginRequest,
            AdminLoginRequest,
            LoginResponse,
            AddToCartRequest,
            CartLine,
            CartView,
            CreateCategoryRequest,
            CategoryList,
            Profile,
            UpdateProfileRequest,
            AddressRequest,
            AddressList,
            AddWishlistRequest,
            WishlistProductList,
            CreateProductRequest,
            UpdateProductRequest,
            InventoryAdjustRequest,
            ProductList,
            PlaceOrderQuery,
            WalletPurchaseQuery,
            PlacedOrder,
            OrderWithItems,
            OrderList,
            UpdateOrderStatusRequest,
            PaymentCallbackQuery,
            CreateCouponRequest,
            ApplyCouponRequest,
            CouponPreview,
            CouponList,
            CreateOfferRequest,
            OfferView,
            OfferList,
            WalletView,
            WalletTransactionList,
            UserList,
            Period,
            ProductSales,
            SalesReport,
            StatusCounts,
            Dashboard,
            RankedItem,
            TopSelling,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<PlacedOrder>,
            ApiResponse<WalletView>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Signup, email verification and login"),
        (name = "Products", description = "Product catalogue"),
        (name = "Categories", description = "Product categories"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Wishlist", description = "Wishlist endpoints"),
        (name = "Profile", description = "Own account details"),
        (name = "Addresses", description = "Delivery addresses"),
        (name = "Orders", description = "Checkout and order endpoints"),
        (name = "Wallet", description = "Wallet balance and ledger"),
        (name = "Coupons", description = "Coupon endpoints"),
        (name = "Payments", description = "Payment gateway callbacks"),
        (name = "Admin", description = "Admin endpoints"),
        (name = "Reports", description = "Sales reporting"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
