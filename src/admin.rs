//! Admin commands run from the CLI against the configured database.
//!
//! Each command opens its own pool, runs one service operation, prints the
//! result, and closes the pool again.

use std::sync::Arc;

use anyhow::Result;
use mockable::DefaultClock;
use sqlx::SqlitePool;

use portfolio_core::contact::{ContactService, ListQuery};
use portfolio_core::models::{timestamp, ContactMessage, StatusCheck};
use portfolio_core::status_check::StatusCheckService;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

fn contact_service(pool: &SqlitePool) -> ContactService<DefaultClock> {
    ContactService::new(
        Arc::new(SqliteStore::new(pool.clone())),
        Arc::new(DefaultClock),
    )
}

/// Core listing function returning structured data.
pub async fn list_messages(
    config: &Config,
    status: Option<String>,
    limit: Option<usize>,
) -> Result<Vec<ContactMessage>> {
    let pool = db::connect(config).await?;
    let query = ListQuery {
        limit: limit.unwrap_or(config.contact.default_list_limit),
        status,
    };
    let result = contact_service(&pool).list(&query).await;
    pool.close().await;
    Ok(result?)
}

/// CLI entry point for `portfolio-api messages`.
pub async fn run_list_messages(
    config: &Config,
    status: Option<String>,
    limit: Option<usize>,
) -> Result<()> {
    let messages = list_messages(config, status, limit).await?;

    if messages.is_empty() {
        println!("No messages.");
        return Ok(());
    }

    for m in &messages {
        println!(
            "{}  [{:<8}]  {}  {} <{}>",
            timestamp::format(&m.timestamp),
            m.status.as_str(),
            m.id,
            m.name,
            m.email
        );
        println!("    subject: {}", m.subject);
    }
    println!("{} message(s)", messages.len());
    Ok(())
}

/// CLI entry point for `portfolio-api mark <id> <status>`.
pub async fn run_mark(config: &Config, id: &str, status: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let result = contact_service(&pool).update_status(id, status).await;
    pool.close().await;
    result?;

    println!("Message {} marked {}.", id, status);
    Ok(())
}

/// Core status check listing returning structured data.
pub async fn list_pings(config: &Config) -> Result<Vec<StatusCheck>> {
    let pool = db::connect(config).await?;
    let service = StatusCheckService::new(
        Arc::new(SqliteStore::new(pool.clone())),
        Arc::new(DefaultClock),
    )
    .with_list_limit(config.status_checks.list_limit);
    let result = service.list().await;
    pool.close().await;
    Ok(result?)
}

/// CLI entry point for `portfolio-api pings`.
pub async fn run_list_pings(config: &Config) -> Result<()> {
    let checks = list_pings(config).await?;
    for c in &checks {
        println!("{}  {}  {}", timestamp::format(&c.timestamp), c.id, c.client_name);
    }
    println!("{} status check(s)", checks.len());
    Ok(())
}
