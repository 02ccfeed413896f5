//! SQLite-backed [`DocumentStore`] implementation.
//!
//! Documents live as JSON text in a single `documents` table (see
//! [`crate::migrate`]). Filters compile to `json_extract` equality tests,
//! sorts to `ORDER BY json_extract(...)`, and patches to `json_set`. Field
//! names are validated and always bound as JSON-path parameters, never
//! spliced into SQL.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool};

use portfolio_core::store::{
    check_field_name, Document, DocumentStore, Filter, Patch, Sort, SortDirection,
};

/// SQLite implementation of the [`DocumentStore`] trait.
///
/// Wraps a [`SqlitePool`] handed in by the caller; the pool's lifetime (and
/// closing it) stays with whoever created it.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// `$.field` path for a validated field name.
fn json_path(field: &str) -> Result<String> {
    check_field_name(field)?;
    Ok(format!("$.{}", field))
}

fn json_text(value: &Value) -> Result<String> {
    serde_json::to_string(value).context("failed to encode filter value")
}

/// Append `AND json_extract(body, ?) IS json_extract(?, '$')` per entry.
///
/// Comparing against `json_extract` of the bound JSON text keeps SQLite's
/// type for the value (text, integer, real, or null).
fn push_equalities(sql: &mut String, fields: &Filter, joiner: &str) {
    for i in 0..fields.len() {
        sql.push_str(if i == 0 { joiner } else { " AND " });
        sql.push_str("json_extract(body, ?) IS json_extract(?, '$')");
    }
}

fn bind_pairs<'q>(mut query: SqliteQuery<'q>, fields: &Filter) -> Result<SqliteQuery<'q>> {
    for (field, value) in fields {
        query = query.bind(json_path(field)?).bind(json_text(value)?);
    }
    Ok(query)
}

fn row_to_document(row: &SqliteRow) -> Result<Document> {
    let body: String = row.try_get("body")?;
    serde_json::from_str(&body).context("stored document is not a JSON object")
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn insert_one(&self, collection: &str, id: &str, document: Document) -> Result<u64> {
        let body = serde_json::to_string(&document).context("failed to encode document")?;

        let result = sqlx::query("INSERT INTO documents (collection, id, body) VALUES (?, ?, ?)")
            .bind(collection)
            .bind(id)
            .bind(body)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        sort: Option<&Sort>,
        limit: usize,
    ) -> Result<Vec<Document>> {
        let mut sql = String::from("SELECT body FROM documents WHERE collection = ?");
        push_equalities(&mut sql, filter, " AND ");
        match sort {
            Some(sort) => {
                let dir = match sort.direction {
                    SortDirection::Ascending => "ASC",
                    SortDirection::Descending => "DESC",
                };
                sql.push_str(&format!(" ORDER BY json_extract(body, ?) {}, seq ASC", dir));
            }
            None => sql.push_str(" ORDER BY seq ASC"),
        }
        sql.push_str(" LIMIT ?");

        let mut query = bind_pairs(sqlx::query(&sql).bind(collection), filter)?;
        if let Some(sort) = sort {
            query = query.bind(json_path(&sort.field)?);
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = query.bind(limit).fetch_all(&self.pool).await?;

        rows.iter().map(row_to_document).collect()
    }

    async fn update_one(&self, collection: &str, filter: &Filter, patch: &Patch) -> Result<u64> {
        if patch.is_empty() {
            anyhow::bail!("update patch must set at least one field");
        }

        // SET json_set(body, path1, json(value1), path2, json(value2), ...)
        let setters = vec!["?, json(?)"; patch.len()].join(", ");
        let mut sql = format!(
            "UPDATE documents SET body = json_set(body, {}) \
             WHERE seq = (SELECT seq FROM documents WHERE collection = ?",
            setters
        );
        push_equalities(&mut sql, filter, " AND ");
        // Only count the row as modified when some patched field changes.
        sql.push_str(" ORDER BY seq ASC LIMIT 1) AND NOT (");
        push_equalities(&mut sql, patch, "");
        sql.push(')');

        let mut query = bind_pairs(sqlx::query(&sql), patch)?;
        query = query.bind(collection);
        query = bind_pairs(query, filter)?;
        query = bind_pairs(query, patch)?;

        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
