//! TOML configuration.
//!
//! ```toml
//! [db]
//! path = "./data/portfolio.sqlite"
//!
//! [server]
//! bind = "127.0.0.1:8001"
//!
//! [contact]
//! default_list_limit = 50
//!
//! [status_checks]
//! list_limit = 1000
//! ```
//!
//! `[contact]` and `[status_checks]` are optional.

use anyhow::{Context, Result};
use portfolio_core::contact::DEFAULT_LIST_LIMIT;
use portfolio_core::status_check::DEFAULT_STATUS_CHECK_LIMIT;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub contact: ContactConfig,
    #[serde(default)]
    pub status_checks: StatusChecksConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContactConfig {
    /// Result cap for `GET /api/contact` when the caller passes no `limit`.
    #[serde(default = "default_list_limit")]
    pub default_list_limit: usize,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            default_list_limit: DEFAULT_LIST_LIMIT,
        }
    }
}

fn default_list_limit() -> usize {
    DEFAULT_LIST_LIMIT
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatusChecksConfig {
    #[serde(default = "default_status_check_limit")]
    pub list_limit: usize,
}

impl Default for StatusChecksConfig {
    fn default() -> Self {
        Self {
            list_limit: DEFAULT_STATUS_CHECK_LIMIT,
        }
    }
}

fn default_status_check_limit() -> usize {
    DEFAULT_STATUS_CHECK_LIMIT
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.db.max_connections == 0 {
        anyhow::bail!("db.max_connections must be >= 1");
    }

    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    if config.contact.default_list_limit == 0 {
        anyhow::bail!("contact.default_list_limit must be >= 1");
    }

    if config.status_checks.list_limit == 0 {
        anyhow::bail!("status_checks.list_limit must be >= 1");
    }

    Ok(())
}
