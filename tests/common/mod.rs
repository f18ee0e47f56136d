#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    Statement,
};
use storefront_api::{
    config::{AppConfig, OtpStoreKind, PayPalConfig},
    db::{create_orm_conn, run_migrations},
    dto::{
        cart::AddToCartRequest,
        orders::{PaymentCallbackQuery, PlaceOrderQuery},
    },
    entity::{
        addresses::ActiveModel as AddressActive, categories::ActiveModel as CategoryActive,
        coupons::{ActiveModel as CouponActive, Model as CouponModel},
        products::{ActiveModel as ProductActive, Entity as Products, Model as ProductModel},
        users::ActiveModel as UserActive,
        wallet_transactions::{Column as TxnCol, Entity as WalletTxns},
    },
    gateway::{GatewayCapture, GatewayError, GatewayOrder, GatewayOrderRequest, PaymentGateway},
    mail::LogMailer,
    middleware::auth::{AdminUser, AuthUser},
    models::Order,
    otp::{MemoryOtpStore, OtpService},
    services::{cart_service, wallet_service},
    state::AppState,
};

pub const COD_LIMIT: i64 = 100_000;

/// Gateway double that approves everything, remembers which order
/// reference each token belongs to and, like PayPal, refuses to capture
/// the same token twice.
#[derive(Default)]
pub struct FakeGateway {
    orders: Mutex<HashMap<String, String>>,
    captured: Mutex<HashSet<String>>,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(
        &self,
        request: GatewayOrderRequest,
    ) -> Result<GatewayOrder, GatewayError> {
        let id = format!("PAY-{}", request.reference_id);
        if let Ok(mut orders) = self.orders.lock() {
            orders.insert(id.clone(), request.reference_id);
        }
        Ok(GatewayOrder {
            approval_url: format!("https://gateway.test/approve?token={id}"),
            id,
        })
    }

    async fn capture_order(&self, token: &str) -> Result<GatewayCapture, GatewayError> {
        let first = self
            .captured
            .lock()
            .map(|mut captured| captured.insert(token.to_string()))
            .unwrap_or(false);
        if !first {
            return Err(GatewayError::Rejected {
                status: 422,
                body: "ORDER_ALREADY_CAPTURED".into(),
            });
        }
        let reference_id = self
            .orders
            .lock()
            .ok()
            .and_then(|orders| orders.get(token).cloned());
        Ok(GatewayCapture {
            status: "COMPLETED".into(),
            reference_id,
        })
    }
}

fn test_config(database_url: &str) -> AppConfig {
    AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        admin_jwt_secret: "test-admin-secret".into(),
        cod_limit: COD_LIMIT,
        cart_max_qty_per_product: 10,
        reservation_ttl_minutes: 30,
        otp_store: OtpStoreKind::Memory,
        paypal: PayPalConfig {
            client_id: String::new(),
            secret: String::new(),
            base_url: "https://gateway.test".into(),
            return_url: "https://shop.test/success".into(),
            cancel_url: "https://shop.test/cancel".into(),
            currency: "USD".into(),
            exchange_rate: 0.012,
        },
        smtp: None,
    }
}

/// Connects to the test database and wipes it, or returns `None` when no
/// database is configured.
pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE wallet_transactions, order_items, orders, cart_items, wishlists, offers, \
         coupons, addresses, products, categories, otp_codes, audit_logs, admins, users \
         RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(Some(AppState {
        orm,
        config: Arc::new(test_config(&database_url)),
        gateway: Arc::new(FakeGateway::default()),
        otp: OtpService::new(Arc::new(MemoryOtpStore::new())),
        mailer: Arc::new(LogMailer),
    }))
}

pub fn admin() -> AdminUser {
    AdminUser {
        subject: "admin".into(),
    }
}

pub async fn create_user(
    state: &AppState,
    email: &str,
    phone: &str,
    wallet_balance: i64,
) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: NotSet,
        name: Set("Test User".into()),
        email: Set(email.to_string()),
        phone: Set(phone.to_string()),
        password_hash: Set("dummy".into()),
        verified: Set(true),
        blocked: Set(false),
        wallet_balance: Set(wallet_balance),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(AuthUser { user_id: user.id })
}

pub async fn create_address(state: &AppState, user: &AuthUser) -> anyhow::Result<i64> {
    let now = Utc::now();
    let address = AddressActive {
        id: NotSet,
        user_id: Set(user.user_id),
        address_line: Set("42 Harbour Road".into()),
        city: Set("Kochi".into()),
        zip_code: Set("682001".into()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(address.id)
}

pub async fn create_product(
    state: &AppState,
    name: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<ProductModel> {
    let category = CategoryActive {
        id: NotSet,
        name: Set(format!("{name} category")),
        description: Set(None),
        deleted: Set(false),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    let product = ProductActive {
        id: NotSet,
        category_id: Set(category.id),
        name: Set(name.to_string()),
        description: Set(Some("A product for testing".into())),
        price: Set(price),
        stock: Set(stock),
        deleted: Set(false),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

pub async fn create_coupon(
    state: &AppState,
    code: &str,
    pct: i32,
    max_discount: i64,
    min_order: i64,
    usage_limit: i32,
) -> anyhow::Result<CouponModel> {
    let now = Utc::now();
    let coupon = CouponActive {
        id: NotSet,
        code: Set(code.to_string()),
        discount_percentage: Set(pct),
        max_discount_amount: Set(max_discount),
        min_order_amount: Set(min_order),
        starts_at: Set((now - Duration::days(1)).into()),
        ends_at: Set((now + Duration::days(1)).into()),
        usage_limit: Set(usage_limit),
        used_count: Set(0),
        created_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(coupon)
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: i64,
    quantity: i32,
) -> anyhow::Result<()> {
    cart_service::add_to_cart(
        state,
        user,
        AddToCartRequest {
            product_id,
            quantity,
        },
    )
    .await?;
    Ok(())
}

pub async fn stock_of(state: &AppState, product_id: i64) -> anyhow::Result<i32> {
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {product_id} missing"))?;
    Ok(product.stock)
}

pub fn gateway_query(address_id: i64) -> PlaceOrderQuery {
    PlaceOrderQuery {
        address_id,
        coupon_code: None,
        payment_method: "paypal".into(),
    }
}

/// Query the gateway sends back after the buyer approves `order`.
pub fn callback_for(order: &Order) -> PaymentCallbackQuery {
    PaymentCallbackQuery {
        token: Some(format!("PAY-{}", order.reference_id)),
        payer_id: Some("PAYER-9".into()),
    }
}

pub async fn refund_rows(state: &AppState, order_id: i64) -> anyhow::Result<u64> {
    Ok(WalletTxns::find()
        .filter(TxnCol::OrderId.eq(order_id))
        .filter(TxnCol::TransactionType.eq("Refund"))
        .count(&state.orm)
        .await?)
}

pub async fn balance(state: &AppState, user: &AuthUser) -> anyhow::Result<i64> {
    let wallet = wallet_service::view_wallet(state, user)
        .await?
        .data
        .expect("wallet");
    assert!(wallet.consistent);
    Ok(wallet.balance)
}
