//! # promo-admin
//!
//! Operator command line for storefront promotions.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  args ──► cli::Cli ──► PromoConfig::load ──► Database::new              │
//! │                                                        │                │
//! │                                                        ▼                │
//! │                          commands::execute (ActivationController,       │
//! │                                             PromotionClient)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cli;
mod commands;

use anyhow::{Context, Result};
use promo_db::Database;
use promo_sync::{ChangeNotifier, PromoConfig};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::commands::AdminState;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse_args();
    let config = PromoConfig::load(cli.config.clone())
        .context("loading promotion configuration")?;
    debug!(path = ?config.database.path, "Configuration loaded");

    if let Some(parent) = config.database.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating data directory {}", parent.display()))?;
        }
    }

    let db = Database::new(config.db_config())
        .await
        .context("opening promotion database")?;
    info!(path = ?config.database.path, "Promotion database ready");

    let state = AdminState {
        store: Arc::new(db.promotions()),
        notifier: ChangeNotifier::from_settings(&config.notifier),
        client: config.client_config(),
    };

    let outcome = commands::execute(cli.command, &state).await;
    db.close().await;
    outcome
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=promo_sync=trace` - Trace the sync crate only
/// - Default: INFO, with sqlx quieted to WARN
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
