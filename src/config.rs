use std::env;

use anyhow::Context;

const PAYPAL_SANDBOX_URL: &str = "https://api-m.sandbox.paypal.com";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub admin_jwt_secret: String,
    /// Highest order total (minor units) accepted for cash on delivery.
    pub cod_limit: i64,
    pub cart_max_qty_per_product: i32,
    pub reservation_ttl_minutes: i64,
    pub otp_store: OtpStoreKind,
    pub paypal: PayPalConfig,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpStoreKind {
    Database,
    Memory,
}

#[derive(Debug, Clone)]
pub struct PayPalConfig {
    pub client_id: String,
    pub secret: String,
    pub base_url: String,
    pub return_url: String,
    pub cancel_url: String,
    pub currency: String,
    pub exchange_rate: f64,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parsed_or("APP_PORT", 3000);
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let admin_jwt_secret =
            env::var("JWT_SECRET_ADMIN").context("JWT_SECRET_ADMIN is not set")?;

        let otp_store = match env::var("OTP_STORE").as_deref() {
            Ok("memory") => OtpStoreKind::Memory,
            _ => OtpStoreKind::Database,
        };

        let paypal = PayPalConfig {
            client_id: env::var("PAYPAL_CLIENT").unwrap_or_default(),
            secret: env::var("PAYPAL_SECRET").unwrap_or_default(),
            base_url: env::var("PAYPAL_BASE_URL")
                .unwrap_or_else(|_| PAYPAL_SANDBOX_URL.to_string()),
            return_url: env::var("PAYPAL_RETURN_URL").unwrap_or_else(|_| {
                format!("http://{host}:{port}/api/payments/paypal/success")
            }),
            cancel_url: env::var("PAYPAL_CANCEL_URL").unwrap_or_else(|_| {
                format!("http://{host}:{port}/api/payments/paypal/cancel")
            }),
            currency: env::var("PAYPAL_CURRENCY").unwrap_or_else(|_| "USD".to_string()),
            exchange_rate: parsed_or("PAYPAL_EXCHANGE_RATE", 0.012),
        };

        let smtp = match env::var("SMTP_HOST") {
            Ok(smtp_host) => Some(SmtpConfig {
                host: smtp_host,
                port: parsed_or("SMTP_PORT", 587),
                username: env::var("SMTP_USERNAME").unwrap_or_default(),
                password: env::var("SMTP_PASSWORD").unwrap_or_default(),
                from: env::var("SMTP_FROM")
                    .unwrap_or_else(|_| "Storefront <no-reply@localhost>".to_string()),
            }),
            Err(_) => None,
        };

        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            admin_jwt_secret,
            cod_limit: parsed_or("COD_LIMIT", 100_000),
            cart_max_qty_per_product: parsed_or("CART_MAX_QTY_PER_PRODUCT", 10),
            reservation_ttl_minutes: parsed_or("ORDER_RESERVATION_TTL_MINUTES", 30),
            otp_store,
            paypal,
            smtp,
        })
    }
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
