//! # Validation Module
//!
//! Input validation for carts and promotion records.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Storefront cart view model                                   │
//! │  └── Quantity steppers, price formatting                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Every cart line before pricing                                    │
//! │  └── Promotion ids and names before any store write                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  └── Single-active partial unique index                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use promo_core::validation::{validate_cart, validate_quantity};
//! use promo_core::CartLine;
//!
//! validate_quantity(5).unwrap();
//! validate_cart(&[CartLine::new("p-1", 1000, 2)]).unwrap();
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::CartLine;
use crate::{MAX_CART_LINES, MAX_ITEM_QUANTITY, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest promotion name the admin panel accepts.
pub const MAX_PROMOTION_NAME_LEN: usize = 120;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed (free samples).
///
/// ## Rules
/// - Must not be negative
/// - Must not exceed MAX_PRICE_CENTS
///
/// ## Example
/// ```rust
/// use promo_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents("unit_price", 0).is_ok());
/// assert!(validate_price_cents("unit_price", -100).is_err());
/// assert!(validate_price_cents("unit_price", i64::MAX).is_err());
/// ```
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    if cents > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

// =============================================================================
// Cart Validators
// =============================================================================

/// Validates a single cart line.
pub fn validate_cart_line(line: &CartLine) -> ValidationResult<()> {
    if line.product_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "product_id".to_string(),
        });
    }

    validate_price_cents("unit_price", line.unit_price.cents())?;
    validate_price_cents("list_price", line.list_price.cents())?;
    validate_quantity(line.quantity)
}

/// Validates a whole cart before pricing.
///
/// Reports the first offending line with its index so the storefront can
/// point at it.
pub fn validate_cart(lines: &[CartLine]) -> CoreResult<()> {
    if lines.len() > MAX_CART_LINES {
        return Err(CoreError::CartTooLarge {
            max: MAX_CART_LINES,
        });
    }

    for (index, line) in lines.iter().enumerate() {
        validate_cart_line(line).map_err(|source| CoreError::InvalidCartLine {
            index,
            product_id: line.product_id.clone(),
            source,
        })?;
    }

    Ok(())
}

// =============================================================================
// Promotion Validators
// =============================================================================

/// Validates a promotion id (UUID format).
///
/// ## Example
/// ```rust
/// use promo_core::validation::validate_promotion_id;
///
/// assert!(validate_promotion_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_promotion_id("not-a-uuid").is_err());
/// ```
pub fn validate_promotion_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "promotion_id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "promotion_id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

/// Validates a promotion display name.
pub fn validate_promotion_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_PROMOTION_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_PROMOTION_NAME_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_cart_line() {
        assert!(validate_cart_line(&CartLine::new("p-1", 0, 1)).is_ok());
        assert!(validate_cart_line(&CartLine::new("", 100, 1)).is_err());
        assert!(validate_cart_line(&CartLine::new("p-1", -1, 1)).is_err());
        assert!(validate_cart_line(&CartLine::new("p-1", 100, 0)).is_err());

        let bad_list = CartLine::from_prices("p-1", Money::from_cents(-5), Some(Money::from_cents(100)), 1);
        assert!(matches!(
            validate_cart_line(&bad_list),
            Err(ValidationError::MustNotBeNegative { ref field }) if field == "list_price"
        ));
    }

    #[test]
    fn test_validate_cart_reports_line_index() {
        let cart = vec![
            CartLine::new("p-1", 100, 1),
            CartLine::new("p-2", 100, -2),
        ];

        match validate_cart(&cart) {
            Err(CoreError::InvalidCartLine { index, product_id, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(product_id, "p-2");
            }
            other => panic!("expected InvalidCartLine, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_cart_size() {
        let cart: Vec<CartLine> = (0..=MAX_CART_LINES)
            .map(|i| CartLine::new(format!("p-{}", i), 100, 1))
            .collect();
        assert!(matches!(validate_cart(&cart), Err(CoreError::CartTooLarge { .. })));
        assert!(validate_cart(&cart[..MAX_CART_LINES]).is_ok());
        assert!(validate_cart(&[]).is_ok());
    }

    #[test]
    fn test_validate_promotion_id() {
        assert!(validate_promotion_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_promotion_id("").is_err());
        assert!(validate_promotion_id("123").is_err());
    }

    #[test]
    fn test_validate_promotion_name() {
        assert!(validate_promotion_name("Buy 3 pay 2").is_ok());
        assert!(validate_promotion_name("   ").is_err());
        assert!(validate_promotion_name(&"x".repeat(MAX_PROMOTION_NAME_LEN + 1)).is_err());
    }
}
