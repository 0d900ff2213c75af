//! # Pricing Engine
//!
//! Applies the active promotion to a cart.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart: 1×10, 1×20, 1×30, 1×40                                          │
//! │                                                                         │
//! │  1. Expand to units        [10, 20, 30, 40]                            │
//! │  2. Sort desc (stable)     [40, 30, 20, 10]                            │
//! │  3. Chunk by group size    [40, 30, 20] [10]                           │
//! │  4. Cheapest of each       [40, 30, FREE] [10 charged]                 │
//! │     complete group free                                                 │
//! │                                                                         │
//! │  original 100  →  final 80  →  savings 20                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The free unit of each group is the lowest-priced unit in that group.
//!
//! Equal prices keep their cart order: the sort is stable and the expansion
//! walks lines front to back. The choice only affects which `product_id`
//! appears in `free_units`, never the totals.

use crate::error::CoreResult;
use crate::money::Money;
use crate::types::{CartLine, FreeUnit, PricingResult, Promotion};
use crate::validation::validate_cart;

/// One unit of one cart line, produced during pricing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRecord<'a> {
    pub line_index: usize,
    pub product_id: &'a str,
    pub price: Money,
}

/// Expands cart lines into one record per unit, in cart order.
pub fn expand_units(lines: &[CartLine]) -> Vec<UnitRecord<'_>> {
    let capacity = lines.iter().map(|l| l.quantity.max(0) as usize).sum();
    let mut units = Vec::with_capacity(capacity);

    for (line_index, line) in lines.iter().enumerate() {
        for _ in 0..line.quantity {
            units.push(UnitRecord {
                line_index,
                product_id: &line.product_id,
                price: line.unit_price,
            });
        }
    }

    units
}

/// Computes what the customer pays for `lines` under `active`.
///
/// Pure and deterministic. The same cart (in any line order) and the same
/// promotion always give the same totals.
///
/// ## Errors
/// Returns a validation error, and no result, when any line has a negative
/// price, an out-of-range quantity, or an empty product id, or when the cart
/// has too many lines.
///
/// ## Example
/// ```rust
/// use promo_core::{compute_pricing, CartLine, Promotion, PromotionKind};
///
/// let mut promo = Promotion::new("3x2", PromotionKind::BuyThreePayTwo);
/// promo.is_active = true;
///
/// let cart = vec![CartLine::new("a", 100, 2), CartLine::new("b", 50, 1)];
/// let result = compute_pricing(&cart, Some(&promo)).unwrap();
///
/// assert_eq!(result.final_total.cents(), 200);
/// assert_eq!(result.savings.cents(), 50);
/// ```
pub fn compute_pricing(lines: &[CartLine], active: Option<&Promotion>) -> CoreResult<PricingResult> {
    validate_cart(lines)?;

    let original_total: Money = lines.iter().map(CartLine::line_total).sum();
    let total_items: i64 = lines.iter().map(|l| l.quantity).sum();

    let promotion = match active {
        Some(p) if p.is_active && !lines.is_empty() => p,
        _ => return Ok(PricingResult::no_promotion(total_items, original_total)),
    };

    let group_size = promotion.kind.group_size();
    let free_per_group = promotion.kind.free_per_group();

    if total_items < group_size {
        let missing = group_size - total_items;
        let mut result = PricingResult::no_promotion(total_items, original_total);
        result.message = Some(format!(
            "Add {} more item(s) to get the cheapest one free",
            missing
        ));
        return Ok(result);
    }

    let mut units = expand_units(lines);
    units.sort_by(|a, b| b.price.cmp(&a.price));

    let group_len = group_size as usize;
    let paid_per_group = (group_size - free_per_group) as usize;
    let complete_groups = units.len() / group_len;

    let mut final_total = Money::zero();
    let mut free_units = Vec::new();

    for (position, unit) in units.iter().enumerate() {
        let in_complete_group = position / group_len < complete_groups;
        if in_complete_group && position % group_len >= paid_per_group {
            free_units.push(FreeUnit {
                product_id: unit.product_id.to_string(),
                price: unit.price,
            });
        } else {
            final_total += unit.price;
        }
    }

    let free_items_count = free_units.len() as i64;
    let message = (free_items_count > 0).then(|| format!("{} free item(s) applied", free_items_count));

    Ok(PricingResult {
        is_active: true,
        total_items,
        original_total,
        final_total,
        savings: original_total - final_total,
        free_items_count,
        message,
        free_units,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
