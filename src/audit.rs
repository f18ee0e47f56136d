//! Append-only trail of state changes that matter to support staff:
//! order transitions, refunds, payments, inventory and account changes.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, Set};
use serde_json::Value;
use uuid::Uuid;

use crate::{entity::audit_logs::ActiveModel as AuditActive, state::AppState};

/// Inserts one audit row on `conn`, which may be a transaction.
pub async fn insert<C: ConnectionTrait>(
    conn: &C,
    user_id: Option<i64>,
    action: &str,
    resource: &str,
    metadata: Value,
) -> Result<(), DbErr> {
    AuditActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        action: Set(action.to_string()),
        resource: Set(Some(resource.to_string())),
        metadata: Set(Some(metadata)),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;
    Ok(())
}

/// Records an event after the change it describes has committed.
/// Audit writes never fail the request that triggered them.
pub async fn record(
    state: &AppState,
    user_id: Option<i64>,
    action: &str,
    resource: &str,
    metadata: Value,
) {
    if let Err(err) = insert(&state.orm, user_id, action, resource, metadata).await {
        tracing::warn!(error = %err, action, "audit log failed");
    }
}
