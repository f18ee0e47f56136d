//! One-time passwords for signup verification.
//!
//! Storage is a capability handed to [`OtpService`]; the database store
//! survives restarts, the in-memory store is for tests and local runs.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use password_hash::rand_core::{OsRng, RngCore};
use sea_orm::{
    ActiveValue::Set, DatabaseConnection, EntityTrait, sea_query::OnConflict,
};
use thiserror::Error;

use crate::entity::otp_codes::{self, Entity as OtpCodes};

pub const OTP_VALIDITY_SECS: i64 = 5 * 60;
pub const RESEND_DELAY_SECS: i64 = 30;

#[derive(Debug, Error)]
pub enum OtpError {
    #[error("you can only resend otp after {seconds} seconds")]
    ResendTooSoon { seconds: i64 },
    #[error("otp store failure")]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpEntry {
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub last_sent_at: DateTime<Utc>,
}

#[async_trait]
pub trait OtpStore: Send + Sync {
    async fn put(&self, email: &str, entry: OtpEntry) -> anyhow::Result<()>;
    async fn get(&self, email: &str) -> anyhow::Result<Option<OtpEntry>>;
    async fn remove(&self, email: &str) -> anyhow::Result<()>;
}

pub struct MemoryOtpStore {
    cache: moka::sync::Cache<String, OtpEntry>,
}

impl MemoryOtpStore {
    pub fn new() -> Self {
        Self {
            cache: moka::sync::Cache::builder()
                .max_capacity(100_000)
                .time_to_live(std::time::Duration::from_secs(OTP_VALIDITY_SECS as u64))
                .build(),
        }
    }
}

impl Default for MemoryOtpStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OtpStore for MemoryOtpStore {
    async fn put(&self, email: &str, entry: OtpEntry) -> anyhow::Result<()> {
        self.cache.insert(email.to_string(), entry);
        Ok(())
    }

    async fn get(&self, email: &str) -> anyhow::Result<Option<OtpEntry>> {
        Ok(self.cache.get(email))
    }

    async fn remove(&self, email: &str) -> anyhow::Result<()> {
        self.cache.invalidate(email);
        Ok(())
    }
}

pub struct DbOtpStore {
    conn: DatabaseConnection,
}

impl DbOtpStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl OtpStore for DbOtpStore {
    async fn put(&self, email: &str, entry: OtpEntry) -> anyhow::Result<()> {
        let row = otp_codes::ActiveModel {
            email: Set(email.to_string()),
            code: Set(entry.code),
            expires_at: Set(entry.expires_at.into()),
            last_sent_at: Set(entry.last_sent_at.into()),
        };
        OtpCodes::insert(row)
            .on_conflict(
                OnConflict::column(otp_codes::Column::Email)
                    .update_columns([
                        otp_codes::Column::Code,
                        otp_codes::Column::ExpiresAt,
                        otp_codes::Column::LastSentAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    async fn get(&self, email: &str) -> anyhow::Result<Option<OtpEntry>> {
        let row = OtpCodes::find_by_id(email.to_string())
            .one(&self.conn)
            .await?;
        Ok(row.map(|model| OtpEntry {
            code: model.code,
            expires_at: model.expires_at.with_timezone(&Utc),
            last_sent_at: model.last_sent_at.with_timezone(&Utc),
        }))
    }

    async fn remove(&self, email: &str) -> anyhow::Result<()> {
        OtpCodes::delete_by_id(email.to_string())
            .exec(&self.conn)
            .await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct OtpService {
    store: Arc<dyn OtpStore>,
}

impl OtpService {
    pub fn new(store: Arc<dyn OtpStore>) -> Self {
        Self { store }
    }

    /// Stores a fresh code for `email` and returns it for delivery.
    pub async fn issue(&self, email: &str) -> Result<String, OtpError> {
        let now = Utc::now();
        let code = generate_code();
        self.store
            .put(
                email,
                OtpEntry {
                    code: code.clone(),
                    expires_at: now + Duration::seconds(OTP_VALIDITY_SECS),
                    last_sent_at: now,
                },
            )
            .await?;
        Ok(code)
    }

    /// Returns the code to re-send: the pending one while it is still
    /// valid, otherwise a new one.
    pub async fn resend(&self, email: &str) -> Result<String, OtpError> {
        let now = Utc::now();
        match self.store.get(email).await? {
            Some(entry) if entry.expires_at > now => {
                let since = now - entry.last_sent_at;
                if since < Duration::seconds(RESEND_DELAY_SECS) {
                    return Err(OtpError::ResendTooSoon {
                        seconds: RESEND_DELAY_SECS,
                    });
                }
                let code = entry.code.clone();
                self.store
                    .put(
                        email,
                        OtpEntry {
                            last_sent_at: now,
                            ..entry
                        },
                    )
                    .await?;
                Ok(code)
            }
            _ => self.issue(email).await,
        }
    }

    /// Consumes the code when it matches and has not expired.
    pub async fn verify(&self, email: &str, code: &str) -> Result<bool, OtpError> {
        let Some(entry) = self.store.get(email).await? else {
            return Ok(false);
        };
        if entry.code == code && Utc::now() < entry.expires_at {
            self.store.remove(email).await?;
            return Ok(true);
        }
        Ok(false)
    }
}

pub fn generate_code() -> String {
    format!("{:06}", OsRng.next_u32() % 1_000_000)
}
