//! # promo-core: Pure Business Logic for Storefront Promotions
//!
//! This crate is the **heart** of the promotion engine. It contains the data
//! model and the pricing algorithm as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Storefront Promotion Architecture                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Storefront / Admin UI                        │   │
//! │  │    Cart page ──► Checkout page ──► Promo banner                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ PricingResult                          │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          promo-sync (PromotionClient, ActivationController)     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ promo-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │ validation│  │   │
//! │  │   │ Promotion │  │   Money   │  │ buy 3     │  │   rules   │  │   │
//! │  │   │ CartLine  │  │           │  │ pay 2     │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Promotion, CartLine, PricingResult)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - The "buy 3, cheapest free" pricing engine
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use promo_core::{compute_pricing, CartLine, Promotion, PromotionKind};
//!
//! let mut promo = Promotion::new("Buy 3 pay 2", PromotionKind::BuyThreePayTwo);
//! promo.is_active = true;
//!
//! let cart = vec![
//!     CartLine::new("p-100", 100, 1),
//!     CartLine::new("p-200", 200, 1),
//!     CartLine::new("p-300", 300, 1),
//! ];
//!
//! let result = compute_pricing(&cart, Some(&promo)).unwrap();
//! assert_eq!(result.final_total.cents(), 500);
//! assert_eq!(result.savings.cents(), 100);
//! assert_eq!(result.free_items_count, 1);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::compute_pricing;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of distinct lines accepted in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single cart line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit or list price accepted, in cents (100 million currency units).
///
/// With the line and quantity limits above, the largest valid cart total is
/// about 10^15 cents, so pricing arithmetic cannot overflow `i64`.
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000;

const _: () = assert!(
    (MAX_CART_LINES as i64)
        .saturating_mul(MAX_ITEM_QUANTITY)
        .saturating_mul(MAX_PRICE_CENTS)
        < i64::MAX
);
