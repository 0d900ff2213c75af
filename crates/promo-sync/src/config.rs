//! # Promotion Engine Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PROMO_DB_PATH=/var/lib/storefront/promotions.db                    │
//! │     PROMO_FETCH_TIMEOUT_MS=2000                                        │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/promotions/promotions.toml (Linux)                       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/var/lib/storefront/promotions.db"
//! max_connections = 5
//! busy_timeout_ms = 5000
//!
//! [client]
//! fetch_timeout_ms = 5000
//!
//! [notifier]
//! channel_capacity = 64
//! ```

use promo_db::DbConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::client::ClientConfig;
use crate::error::{SyncError, SyncResult};

// =============================================================================
// Database Settings
// =============================================================================

/// Where and how to open the promotion store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file path.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long an activation waits on SQLite's write lock.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("com", "storefront", "promotions")
        .map(|dirs| dirs.data_dir().join("promotions.db"))
        .unwrap_or_else(|| PathBuf::from("promotions.db"))
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout() -> u64 {
    5000
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

// =============================================================================
// Client Settings
// =============================================================================

/// Viewer client behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Upper bound for one active-promotion fetch. On expiry the client
    /// serves prices without a promotion.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_ms: u64,
}

fn default_fetch_timeout() -> u64 {
    5000
}

impl Default for ClientSettings {
    fn default() -> Self {
        ClientSettings {
            fetch_timeout_ms: default_fetch_timeout(),
        }
    }
}

// =============================================================================
// Notifier Settings
// =============================================================================

/// Change fan-out settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierSettings {
    /// Events buffered per subscriber before it is reported as lagging.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    64
}

impl Default for NotifierSettings {
    fn default() -> Self {
        NotifierSettings {
            channel_capacity: default_channel_capacity(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromoConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub client: ClientSettings,

    #[serde(default)]
    pub notifier: NotifierSettings,
}

impl PromoConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (promotions.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading promotion config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load promotion config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Promotion config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(SyncError::InvalidConfig("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(SyncError::InvalidConfig(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.client.fetch_timeout_ms == 0 {
            return Err(SyncError::InvalidConfig(
                "client.fetch_timeout_ms must be greater than 0".into(),
            ));
        }

        if self.notifier.channel_capacity == 0 {
            return Err(SyncError::InvalidConfig(
                "notifier.channel_capacity must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `PROMO_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("PROMO_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("PROMO_DB_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(m) => self.database.max_connections = m,
                Err(_) => warn!(value = %max, "Ignoring invalid PROMO_DB_MAX_CONNECTIONS"),
            }
        }

        if let Some(timeout) = lookup("PROMO_FETCH_TIMEOUT_MS") {
            match timeout.parse::<u64>() {
                Ok(t) => self.client.fetch_timeout_ms = t,
                Err(_) => warn!(value = %timeout, "Ignoring invalid PROMO_FETCH_TIMEOUT_MS"),
            }
        }

        if let Some(capacity) = lookup("PROMO_CHANNEL_CAPACITY") {
            match capacity.parse::<usize>() {
                Ok(c) => self.notifier.channel_capacity = c,
                Err(_) => warn!(value = %capacity, "Ignoring invalid PROMO_CHANNEL_CAPACITY"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "storefront", "promotions")
            .map(|dirs| dirs.config_dir().join("promotions.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Database pool settings for `promo_db::Database::new`.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database.path.clone())
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_millis(self.database.busy_timeout_ms))
    }

    /// Settings for `PromotionClient::spawn`.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            fetch_timeout: Duration::from_millis(self.client.fetch_timeout_ms),
        }
    }
}
