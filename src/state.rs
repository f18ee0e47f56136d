use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    config::AppConfig, db::DbPool, gateway::PaymentGateway, mail::Mailer, otp::OtpService,
};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub otp: OtpService,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// The sqlx pool sea-orm runs on, used for raw aggregate queries.
    pub fn pool(&self) -> &DbPool {
        self.orm.get_postgres_connection_pool()
    }
}
