use serde::Serialize;
use utoipa::ToSchema;

use crate::models::WalletTransaction;

#[derive(Debug, Serialize, ToSchema)]
pub struct WalletView {
    pub balance: i64,
    /// Refunds minus debits, recomputed from the ledger.
    pub ledger_balance: i64,
    pub consistent: bool,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct WalletTransactionList {
    #[schema(value_type = Vec<WalletTransaction>)]
    pub items: Vec<WalletTransaction>,
}
