//! # Domain Types
//!
//! Core domain types used by the promotion engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Promotion     │   │    CartLine     │   │  PricingResult  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  product_id     │   │  original_total │       │
//! │  │  name           │   │  unit_price     │   │  final_total    │       │
//! │  │  kind           │   │  list_price     │   │  savings        │       │
//! │  │  is_active      │   │  quantity       │   │  free_units     │       │
//! │  │  version        │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                              │
//! │  │ PromotionKind   │   │    FreeUnit     │                              │
//! │  │  ─────────────  │   │  ─────────────  │                              │
//! │  │  BuyThreePayTwo │   │  product_id     │                              │
//! │  │  "buy3-pay2"    │   │  price          │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! At most one `Promotion` is active at a time. That rule is owned by the
//! activation path in promo-sync and backed by the schema in promo-db.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Promotion Kind
// =============================================================================

/// The promotion mechanic.
///
/// Only one mechanic exists today. The pricing engine reads the grouping
/// parameters from here rather than hard-coding them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum PromotionKind {
    /// Every group of three units, the cheapest one is free.
    #[serde(rename = "buy3-pay2")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "buy3-pay2"))]
    BuyThreePayTwo,
}

impl PromotionKind {
    /// Number of units that form one discount group.
    #[inline]
    pub const fn group_size(&self) -> i64 {
        match self {
            PromotionKind::BuyThreePayTwo => 3,
        }
    }

    /// Number of units free in each complete group.
    #[inline]
    pub const fn free_per_group(&self) -> i64 {
        match self {
            PromotionKind::BuyThreePayTwo => 1,
        }
    }

    /// Wire and storage name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PromotionKind::BuyThreePayTwo => "buy3-pay2",
        }
    }
}

impl Default for PromotionKind {
    fn default() -> Self {
        PromotionKind::BuyThreePayTwo
    }
}

impl std::fmt::Display for PromotionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PromotionKind {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy3-pay2" => Ok(PromotionKind::BuyThreePayTwo),
            other => Err(crate::error::ValidationError::InvalidFormat {
                field: "kind".to_string(),
                reason: format!("unknown promotion kind '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Promotion
// =============================================================================

/// A promotion record as stored and as served to storefront viewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Promotion {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown in the admin panel and the promo banner.
    pub name: String,

    pub kind: PromotionKind,

    /// At most one promotion has this set at any observed instant.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    /// Optimistic-concurrency token, incremented on every write.
    pub version: i64,
}

impl Promotion {
    /// Creates a fresh, inactive promotion with a new id.
    pub fn new(name: impl Into<String>, kind: PromotionKind) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            kind,
            is_active: false,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// One product line of the caller's cart.
///
/// Snapshot owned by the caller. The engine only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,

    /// Effective per-unit price (sale price when set, else list price).
    pub unit_price: Money,

    /// Catalog price before any sale.
    pub list_price: Money,

    pub quantity: i64,
}

impl CartLine {
    /// Creates a line whose list and effective price are the same.
    pub fn new(product_id: impl Into<String>, price_cents: i64, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            unit_price: Money::from_cents(price_cents),
            list_price: Money::from_cents(price_cents),
            quantity,
        }
    }

    /// Builds a line from catalog data, picking the sale price when present.
    ///
    /// ## Example
    /// ```rust
    /// use promo_core::{CartLine, Money};
    ///
    /// let line = CartLine::from_prices("p-1", Money::from_cents(2000), Some(Money::from_cents(1500)), 2);
    /// assert_eq!(line.unit_price.cents(), 1500);
    /// assert_eq!(line.list_price.cents(), 2000);
    /// ```
    pub fn from_prices(
        product_id: impl Into<String>,
        list_price: Money,
        sale_price: Option<Money>,
        quantity: i64,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            unit_price: sale_price.unwrap_or(list_price),
            list_price,
            quantity,
        }
    }

    /// unit_price × quantity
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Pricing Result
// =============================================================================

/// A unit the promotion made free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FreeUnit {
    pub product_id: String,
    pub price: Money,
}

/// Output of the pricing engine.
///
/// ## Invariants
/// - `final_total == original_total - savings`
/// - `savings >= 0`
/// - `final_total <= original_total`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PricingResult {
    /// True when a promotion was applied to this cart.
    pub is_active: bool,
    pub total_items: i64,
    pub original_total: Money,
    pub final_total: Money,
    pub savings: Money,
    pub free_items_count: i64,
    /// Banner text ("Add 1 more item(s)..." or "1 free item(s) applied").
    pub message: Option<String>,
    pub free_units: Vec<FreeUnit>,
}

impl PricingResult {
    /// Result for a cart priced without any discount.
    pub fn no_promotion(total_items: i64, original_total: Money) -> Self {
        Self {
            is_active: false,
            total_items,
            original_total,
            final_total: original_total,
            savings: Money::zero(),
            free_items_count: 0,
            message: None,
            free_units: Vec::new(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promotion_kind_wire_name() {
        let json = serde_json::to_string(&PromotionKind::BuyThreePayTwo).unwrap();
        assert_eq!(json, "\"buy3-pay2\"");

        let parsed: PromotionKind = "buy3-pay2".parse().unwrap();
        assert_eq!(parsed, PromotionKind::BuyThreePayTwo);
        assert!("buy2-pay1".parse::<PromotionKind>().is_err());
    }

    #[test]
    fn test_promotion_kind_grouping() {
        let kind = PromotionKind::BuyThreePayTwo;
        assert_eq!(kind.group_size(), 3);
        assert_eq!(kind.free_per_group(), 1);
    }

    #[test]
    fn test_new_promotion_is_inactive() {
        let promo = Promotion::new("Summer", PromotionKind::BuyThreePayTwo);
        assert!(!promo.is_active);
        assert_eq!(promo.version, 0);
        assert_eq!(promo.id.len(), 36);
        assert_eq!(promo.created_at, promo.updated_at);
    }

    #[test]
    fn test_from_prices_prefers_sale_price() {
        let on_sale = CartLine::from_prices("a", Money::from_cents(2000), Some(Money::from_cents(1500)), 1);
        assert_eq!(on_sale.unit_price.cents(), 1500);

        let regular = CartLine::from_prices("b", Money::from_cents(2000), None, 3);
        assert_eq!(regular.unit_price.cents(), 2000);
        assert_eq!(regular.line_total().cents(), 6000);
    }

    #[test]
    fn test_pricing_result_serializes_camel_case() {
        let result = PricingResult::no_promotion(2, Money::from_cents(500));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["finalTotal"], 500);
        assert_eq!(json["freeItemsCount"], 0);
        assert_eq!(json["isActive"], false);
        assert!(json["message"].is_null());
    }
}
