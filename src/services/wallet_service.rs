//! Wallet ledger.
//!
//! `users.wallet_balance` is a cached value; `wallet_transactions` is the
//! append-only record it must always agree with. Both are only ever written
//! together, inside the caller's transaction.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::{
    dto::wallet::{WalletTransactionList, WalletView},
    entity::{
        users::{Column as UserCol, Entity as Users},
        wallet_transactions::{ActiveModel as TxnActive, Column as TxnCol, Entity as WalletTxns},
    },
    error::{AppError, AppResult, CheckoutError},
    middleware::auth::AuthUser,
    models::WalletTransaction,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Refund,
    Debit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Refund => "Refund",
            TransactionType::Debit => "Debit",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Refund" => Some(TransactionType::Refund),
            "Debit" => Some(TransactionType::Debit),
            _ => None,
        }
    }

    /// Effect of an entry of this type on the balance.
    pub fn signed(&self, amount: i64) -> i64 {
        match self {
            TransactionType::Refund => amount,
            TransactionType::Debit => -amount,
        }
    }
}

/// Balance implied by a sequence of ledger entries.
pub fn ledger_balance<'a, I>(entries: I) -> i64
where
    I: IntoIterator<Item = (&'a str, i64)>,
{
    entries
        .into_iter()
        .filter_map(|(kind, amount)| TransactionType::parse(kind).map(|t| t.signed(amount)))
        .sum()
}

/// Credits `amount` back to the user for `order_id`. Returns `false` when
/// nothing was credited: a zero amount, or the order was already refunded.
pub async fn credit_refund<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    order_id: i64,
    amount: i64,
) -> Result<bool, DbErr> {
    if amount <= 0 {
        return Ok(false);
    }

    let already = WalletTxns::find()
        .filter(
            Condition::all()
                .add(TxnCol::OrderId.eq(order_id))
                .add(TxnCol::TransactionType.eq(TransactionType::Refund.as_str())),
        )
        .one(conn)
        .await?;
    if already.is_some() {
        tracing::warn!(order_id, user_id, "order already refunded, skipping wallet credit");
        return Ok(false);
    }

    let updated = Users::update_many()
        .col_expr(
            UserCol::WalletBalance,
            Expr::col(UserCol::WalletBalance).add(amount),
        )
        .filter(UserCol::Id.eq(user_id))
        .exec(conn)
        .await?;
    if updated.rows_affected == 0 {
        return Err(DbErr::RecordNotUpdated);
    }

    append(conn, user_id, order_id, amount, TransactionType::Refund).await?;
    tracing::info!(order_id, user_id, amount, "wallet refund credited");
    Ok(true)
}

/// Pays `amount` for `order_id` out of the wallet.
pub async fn debit_for_order<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    order_id: i64,
    amount: i64,
) -> AppResult<()> {
    if amount <= 0 {
        return Ok(());
    }

    let updated = Users::update_many()
        .col_expr(
            UserCol::WalletBalance,
            Expr::col(UserCol::WalletBalance).sub(amount),
        )
        .filter(
            Condition::all()
                .add(UserCol::Id.eq(user_id))
                .add(UserCol::WalletBalance.gte(amount)),
        )
        .exec(conn)
        .await?;
    if updated.rows_affected == 0 {
        return Err(CheckoutError::InsufficientWalletBalance.into());
    }

    append(conn, user_id, order_id, amount, TransactionType::Debit).await?;
    Ok(())
}

async fn append<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    order_id: i64,
    amount: i64,
    kind: TransactionType,
) -> Result<(), DbErr> {
    TxnActive {
        id: NotSet,
        user_id: Set(user_id),
        order_id: Set(Some(order_id)),
        amount: Set(amount),
        transaction_type: Set(kind.as_str().to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;
    Ok(())
}

pub async fn view_wallet(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<WalletView>> {
    let account = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let entries: Vec<(String, i64)> = WalletTxns::find()
        .select_only()
        .column(TxnCol::TransactionType)
        .column(TxnCol::Amount)
        .filter(TxnCol::UserId.eq(user.user_id))
        .into_tuple()
        .all(&state.orm)
        .await?;
    let ledger = ledger_balance(entries.iter().map(|(kind, amount)| (kind.as_str(), *amount)));

    if ledger != account.wallet_balance {
        tracing::error!(
            user_id = user.user_id,
            balance = account.wallet_balance,
            ledger,
            "wallet balance disagrees with ledger"
        );
    }

    Ok(ApiResponse::success(
        "Wallet",
        WalletView {
            balance: account.wallet_balance,
            ledger_balance: ledger,
            consistent: ledger == account.wallet_balance,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_transactions(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<WalletTransactionList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = WalletTxns::find()
        .filter(TxnCol::UserId.eq(user.user_id))
        .order_by_desc(TxnCol::CreatedAt)
        .order_by_desc(TxnCol::Id);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(WalletTransaction::from)
        .collect();

    Ok(ApiResponse::success(
        "Wallet transactions",
        WalletTransactionList { items },
        Some(Meta::new(page, limit, total)),
    ))
}
