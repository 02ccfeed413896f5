//! # Portfolio API CLI (`portfolio-api`)
//!
//! ## Usage
//!
//! ```bash
//! portfolio-api --config ./config/portfolio.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `portfolio-api init` | Create the SQLite database and schema |
//! | `portfolio-api serve` | Start the HTTP server |
//! | `portfolio-api messages` | List contact messages, newest first |
//! | `portfolio-api mark <id> <status>` | Set a contact message's status |
//! | `portfolio-api pings` | List status checks |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use portfolio_api::{admin, config, migrate, server};

/// Portfolio API: status pings and contact form submissions.
#[derive(Parser)]
#[command(name = "portfolio-api", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/portfolio.toml")]
    config: PathBuf,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent; running it multiple times is safe.
    Init,

    /// Start the HTTP server on `[server].bind`.
    Serve,

    /// List contact messages, newest first.
    Messages {
        /// Only show messages with this status (`unread`, `read`, `archived`).
        #[arg(long)]
        status: Option<String>,

        /// Maximum number of messages to show.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Change a contact message's status.
    Mark {
        /// Message id.
        id: String,
        /// New status: `unread`, `read`, or `archived`.
        status: String,
    },

    /// List recorded status checks.
    Pings,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Messages { status, limit } => {
            admin::run_list_messages(&cfg, status, limit).await?;
        }
        Commands::Mark { id, status } => {
            admin::run_mark(&cfg, &id, &status).await?;
        }
        Commands::Pings => {
            admin::run_list_pings(&cfg).await?;
        }
    }

    Ok(())
}
