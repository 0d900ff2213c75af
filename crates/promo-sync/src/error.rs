//! # Sync Error Types
//!
//! Error types for activation, notification and viewer clients.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │     Store       │  │     Records             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  StoreUnavail.  │  │  PromotionNotFound      │ │
//! │  │  ConfigLoad     │  │  DatabaseError  │  │  VersionConflict        │ │
//! │  │  ConfigSave     │  │  Timeout        │  │  Validation             │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  Lifecycle: ClientClosed                                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Every failure the operator or a viewer client can observe.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Record Errors
    // =========================================================================
    /// No promotion with this id.
    #[error("Promotion not found: {0}")]
    PromotionNotFound(String),

    /// Compare-and-swap write lost against a newer version.
    #[error("Promotion {id} was modified concurrently (expected version {expected}, found {actual})")]
    VersionConflict {
        id: String,
        expected: i64,
        actual: i64,
    },

    /// Caller input failed validation.
    #[error("Validation failed: {0}")]
    Validation(String),

    // =========================================================================
    // Store Errors
    // =========================================================================
    /// The store is temporarily unreachable (pool exhausted, locked, closed).
    #[error("Promotion store unavailable: {0}")]
    StoreUnavailable(String),

    /// Any other store failure.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A store call did not finish in time.
    #[error("Store call timed out after {0} ms")]
    Timeout(u64),

    // =========================================================================
    // Lifecycle Errors
    // =========================================================================
    /// The promotion client was closed.
    #[error("Promotion client is closed")]
    ClientClosed,
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<promo_db::DbError> for SyncError {
    fn from(err: promo_db::DbError) -> Self {
        use promo_db::DbError;

        match err {
            DbError::NotFound { id, .. } => SyncError::PromotionNotFound(id),
            DbError::VersionConflict {
                id,
                expected,
                actual,
            } => SyncError::VersionConflict {
                id,
                expected,
                actual,
            },
            other if other.is_transient() => SyncError::StoreUnavailable(other.to_string()),
            other => SyncError::DatabaseError(other.to_string()),
        }
    }
}

impl From<promo_core::CoreError> for SyncError {
    fn from(err: promo_core::CoreError) -> Self {
        SyncError::Validation(err.to_string())
    }
}

impl From<promo_core::ValidationError> for SyncError {
    fn from(err: promo_core::ValidationError) -> Self {
        SyncError::Validation(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Returns true if the same call may succeed when repeated unchanged.
    ///
    /// A version conflict is not retryable as-is: the caller has to re-read
    /// the record first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::StoreUnavailable(_) | SyncError::Timeout(_))
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_) | SyncError::ConfigLoadFailed(_) | SyncError::ConfigSaveFailed(_)
        )
    }
}
