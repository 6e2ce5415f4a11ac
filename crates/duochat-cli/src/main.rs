//! Duochat CLI — entry point.
//!
//! # Commands
//!
//! - `duochat serve` — web UI (login, chat view, send, delete)
//! - `duochat chat -u USER` — the same session loop in the terminal
//! - `duochat onboard` — initialize config + data directory
//! - `duochat status` — show configuration and store status

mod helpers;
mod onboard;
mod repl;
mod server;
mod status;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use duochat_core::config::{load_config, Config};
use duochat_core::MessageStore;
use duochat_providers::{create_provider, ReplyProvider};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// 💬 Duochat — a cozy two-person chat with file-backed history
#[derive(Parser)]
#[command(name = "duochat", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web UI
    Serve {
        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Chat in the terminal
    Chat {
        /// Identity to log in as
        #[arg(short, long)]
        user: String,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Initialize configuration and data directory
    Onboard,

    /// Show configuration and store status
    Status,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { logs } => {
            init_logging(logs);
            let config = load_config(None);
            server::run(&config).await
        }
        Commands::Chat { user, logs } => {
            init_logging(logs);
            let config = load_config(None);
            let store = build_store(&config)?;
            let provider = build_provider(&config);
            repl::run(&config, store, provider, &user).await
        }
        Commands::Onboard => onboard::run(),
        Commands::Status => status::run(),
    }
}

// ─────────────────────────────────────────────
// Shared builders
// ─────────────────────────────────────────────

/// Build the message store from the `store` and `display` sections.
pub fn build_store(config: &Config) -> Result<MessageStore> {
    let data_dir = config.store.data_path();
    let store = MessageStore::new(Some(data_dir.clone()), config.display.tz())
        .with_context(|| format!("failed to open chat data dir: {}", data_dir.display()))?
        .with_retention(config.store.retention());
    info!(data_dir = %data_dir.display(), "message store ready");
    Ok(store)
}

/// Build the AI reply provider, or `None` when no key is configured.
pub fn build_provider(config: &Config) -> Option<Arc<dyn ReplyProvider>> {
    match create_provider(&config.ai) {
        Ok(provider) => Some(Arc::new(provider)),
        Err(e) => {
            warn!("{e} /ai is disabled.");
            None
        }
    }
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("duochat=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
