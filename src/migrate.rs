use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Create the schema on a fresh pool and close it again.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let result = apply(&pool).await;
    pool.close().await;
    result
}

/// Idempotently create the document table and its indexes.
///
/// Every collection shares one table: a document is a JSON object in
/// `body`, keyed by its application-level `id` within its `collection`.
/// `seq` preserves insertion order.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            body TEXT NOT NULL CHECK (json_valid(body)),
            UNIQUE(collection, id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_documents_timestamp ON documents(collection, json_extract(body, '$.timestamp') DESC)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_documents_status ON documents(collection, json_extract(body, '$.status'))",
    )
    .execute(pool)
    .await?;

    Ok(())
}
