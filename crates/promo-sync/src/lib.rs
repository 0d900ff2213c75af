//! # promo-sync: Activation and Viewer Consistency
//!
//! Keeps "which promotion is active" consistent between the admin actor and
//! every storefront viewer.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  operator                                                               │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  ┌──────────────────────┐  activate_exclusive  ┌──────────────────────┐ │
//! │  │ ActivationController │ ───────────────────► │ PromotionStore       │ │
//! │  └──────────┬───────────┘                      │ (SQLite via promo-db)│ │
//! │             │ notify()                         └──────────▲───────────┘ │
//! │             ▼                                             │ fetch_active│
//! │  ┌──────────────────────┐   ChangeEvent   ┌───────────────┴──────────┐  │
//! │  │ ChangeNotifier       │ ──────────────► │ PromotionClient (×N)     │  │
//! │  │ topic "promotions"   │                 │ Loading ⇄ Resolved       │  │
//! │  └──────────────────────┘                 └───────────────┬──────────┘  │
//! │                                                           │ price()     │
//! │                                                           ▼             │
//! │                                            promo_core::compute_pricing  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`activation`] - `ActivationController` (admin writes + notify)
//! - [`client`] - `PromotionClient` (per-viewer cache with refetch)
//! - [`notifier`] - `ChangeNotifier` broadcast fan-out
//! - [`store`] - `PromotionStore` trait and its SQLite implementation
//! - [`config`] - TOML + environment configuration
//! - [`error`] - Error types

// =============================================================================
// Module Declarations
// =============================================================================

pub mod activation;
pub mod client;
pub mod config;
pub mod error;
pub mod notifier;
pub mod store;

#[cfg(test)]
mod fake_store;

// =============================================================================
// Re-exports
// =============================================================================

pub use activation::ActivationController;
pub use client::{ClientConfig, ClientSnapshot, ClientStatus, PromotionClient};
pub use config::PromoConfig;
pub use error::{SyncError, SyncResult};
pub use notifier::{CallbackHandle, ChangeEvent, ChangeNotifier, Subscription, PROMOTIONS_TOPIC};
pub use store::PromotionStore;
