use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, Statement, TransactionTrait, Value,
};
use tokio::fs;

/// The sqlx pool underneath the sea-orm connection.
pub type DbPool = sqlx::PgPool;

const MIGRATIONS_DIR: &str = "migrations";

pub async fn create_orm_conn(database_url: &str) -> Result<DatabaseConnection> {
    let conn = Database::connect(database_url).await?;
    Ok(conn)
}

/// Applies the `.sql` files in `migrations/` that have not run yet, in
/// filename order, each in its own transaction. Returns the names applied.
pub async fn run_migrations(conn: &DatabaseConnection) -> Result<Vec<String>> {
    let backend = conn.get_database_backend();
    conn.execute(Statement::from_string(
        backend,
        "CREATE TABLE IF NOT EXISTS schema_migrations (\
             filename TEXT PRIMARY KEY, \
             applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW())",
    ))
    .await?;

    let applied: HashSet<String> = conn
        .query_all(Statement::from_string(
            backend,
            "SELECT filename FROM schema_migrations",
        ))
        .await?
        .iter()
        .map(|row| row.try_get::<String>("", "filename"))
        .collect::<Result<_, _>>()?;

    let mut newly_applied = Vec::new();
    for file in migration_files().await? {
        let name = file
            .file_name()
            .and_then(|n| n.to_str())
            .context("migration file name is not utf-8")?
            .to_string();
        if applied.contains(&name) {
            continue;
        }

        let sql = fs::read_to_string(&file).await?;
        let txn = conn.begin().await?;
        // Prepared statements hold a single command each.
        for stmt in sql.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            txn.execute(Statement::from_string(backend, format!("{stmt};")))
                .await
                .with_context(|| format!("migration {name} failed"))?;
        }
        txn.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO schema_migrations (filename) VALUES ($1)",
            [Value::from(name.clone())],
        ))
        .await?;
        txn.commit().await?;

        tracing::info!(migration = %name, "migration applied");
        newly_applied.push(name);
    }

    Ok(newly_applied)
}

async fn migration_files() -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(MIGRATIONS_DIR)
        .await
        .with_context(|| format!("cannot read {MIGRATIONS_DIR}/"))?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
