//! # Validation Module
//!
//! Input validation utilities for cart edits.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Order wizard (frontend)                                      │
//! │  └── Immediate feedback on obviously bad input                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE + cart constructors                              │
//! │  ├── Quantity range, discount range, code format                       │
//! │  └── Modifier ↔ category applicability (via the catalog)               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Calculation algorithm                                        │
//! │  └── Assumes valid input; never sees a rejected edit                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use aksi_core::validation::{validate_quantity, validate_discount_percent};
//!
//! assert!(validate_quantity(2).is_ok());
//! assert!(validate_discount_percent(150).is_err());
//! ```

use crate::error::{ValidationError, ValidationResult};
use crate::types::ModifierKind;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_MODIFIERS_PER_LINE, MAX_UNIT_PRICE_MINOR};

/// Maximum length of a modifier code.
pub const MAX_MODIFIER_CODE_LEN: usize = 50;

/// Lowest percentage modifier rate (-100%).
pub const MIN_MODIFIER_RATE_BPS: i64 = -10_000;

/// Highest percentage modifier rate (+1000%).
pub const MAX_MODIFIER_RATE_BPS: i64 = 100_000;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line item quantity.
///
/// ## Rules
/// - Must be positive (>= 1)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Item wizard: quantity field                                            │
/// │                                                                         │
/// │  User types: 0                                                          │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(0) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0?  → Error: "quantity must be positive"              │
/// │       ├── qty > 999? → Error: "quantity must be between 1 and 999"     │
/// │       └── OK → LineItem rebuilt, cart snapshot emitted                  │
/// │                                                                         │
/// │  On error the previous line item stays in the cart.                     │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
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

/// Validates a custom discount percentage (whole percent, 0-100 inclusive).
pub fn validate_discount_percent(percent: i64) -> ValidationResult<()> {
    if !(0..=100).contains(&percent) {
        return Err(ValidationError::OutOfRange {
            field: "discount percentage".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

/// Validates a catalog unit price. Zero is allowed (complimentary services).
///
/// ## Rules
/// - Between 0 and MAX_UNIT_PRICE_MINOR
pub fn validate_unit_price_minor(minor: i64) -> ValidationResult<()> {
    if !(0..=MAX_UNIT_PRICE_MINOR).contains(&minor) {
        return Err(ValidationError::OutOfRange {
            field: "unit price".to_string(),
            min: 0,
            max: MAX_UNIT_PRICE_MINOR,
        });
    }

    Ok(())
}

/// Validates a price-list modifier value.
///
/// ## Rules
/// - PERCENTAGE: between -10000 and 100000 bps (-100% to +1000%)
/// - FIXED: magnitude at most MAX_UNIT_PRICE_MINOR (may be negative)
pub fn validate_modifier_kind(kind: &ModifierKind) -> ValidationResult<()> {
    match kind {
        ModifierKind::Percentage(rate) => {
            if !(MIN_MODIFIER_RATE_BPS..=MAX_MODIFIER_RATE_BPS).contains(&rate.bps()) {
                return Err(ValidationError::OutOfRange {
                    field: "modifier rate".to_string(),
                    min: MIN_MODIFIER_RATE_BPS,
                    max: MAX_MODIFIER_RATE_BPS,
                });
            }
        }
        ModifierKind::Fixed(amount) => {
            if !(-MAX_UNIT_PRICE_MINOR..=MAX_UNIT_PRICE_MINOR).contains(&amount.minor()) {
                return Err(ValidationError::OutOfRange {
                    field: "modifier amount".to_string(),
                    min: -MAX_UNIT_PRICE_MINOR,
                    max: MAX_UNIT_PRICE_MINOR,
                });
            }
        }
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates an already-normalised modifier code.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only `A-Z`, `0-9` and `_`
pub fn validate_modifier_code(code: &str) -> ValidationResult<()> {
    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "modifier code".to_string(),
        });
    }

    if code.len() > MAX_MODIFIER_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "modifier code".to_string(),
            max: MAX_MODIFIER_CODE_LEN,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "modifier code".to_string(),
            reason: "must contain only letters, digits and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a line item or catalog identifier.
pub fn validate_identifier(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of modifiers selected for one line.
pub fn validate_modifier_count(count: usize) -> ValidationResult<()> {
    if count > MAX_MODIFIERS_PER_LINE {
        return Err(ValidationError::OutOfRange {
            field: "modifiers per line".to_string(),
            min: 0,
            max: MAX_MODIFIERS_PER_LINE as i64,
        });
    }

    Ok(())
}

/// Validates that one more line can be added to a cart holding `current_items`.
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(matches!(
            validate_quantity(0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(validate_quantity(-3).is_err());
        assert!(matches!(
            validate_quantity(1000),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_discount_percent() {
        assert!(validate_discount_percent(0).is_ok());
        assert!(validate_discount_percent(50).is_ok());
        assert!(validate_discount_percent(100).is_ok());
        assert!(validate_discount_percent(101).is_err());
        assert!(validate_discount_percent(-1).is_err());
    }

    #[test]
    fn test_validate_modifier_code() {
        assert!(validate_modifier_code("HEAVY_SOILING").is_ok());
        assert!(validate_modifier_code("KIDS_UNDER_10").is_ok());

        assert!(validate_modifier_code("").is_err());
        assert!(validate_modifier_code("lowercase").is_err());
        assert!(validate_modifier_code("DASH-ED").is_err());
        assert!(validate_modifier_code(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(0).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS - 1).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS).is_err());
    }

    #[test]
    fn test_validate_identifier_and_price() {
        assert!(validate_identifier("catalog item id", "coat-wool").is_ok());
        assert!(validate_identifier("catalog item id", "  ").is_err());
        assert!(validate_unit_price_minor(0).is_ok());
        assert!(validate_unit_price_minor(-1).is_err());
        assert!(validate_unit_price_minor(MAX_UNIT_PRICE_MINOR).is_ok());
        assert!(validate_unit_price_minor(MAX_UNIT_PRICE_MINOR + 1).is_err());
        assert!(validate_unit_price_minor(i64::MAX / 2).is_err());
    }

    #[test]
    fn test_validate_modifier_kind() {
        use crate::money::Money;
        use crate::types::Rate;

        assert!(validate_modifier_kind(&ModifierKind::Percentage(Rate::from_percent(-100))).is_ok());
        assert!(validate_modifier_kind(&ModifierKind::Percentage(Rate::from_percent(1000))).is_ok());
        assert!(validate_modifier_kind(&ModifierKind::Percentage(Rate::from_bps(100_001))).is_err());
        assert!(validate_modifier_kind(&ModifierKind::Percentage(Rate::from_bps(i64::MAX / 2))).is_err());
        assert!(validate_modifier_kind(&ModifierKind::Percentage(Rate::from_bps(-10_001))).is_err());

        assert!(validate_modifier_kind(&ModifierKind::Fixed(Money::from_minor(-50000))).is_ok());
        assert!(validate_modifier_kind(&ModifierKind::Fixed(Money::from_minor(i64::MIN))).is_err());
    }

    #[test]
    fn test_validate_modifier_count() {
        assert!(validate_modifier_count(0).is_ok());
        assert!(validate_modifier_count(MAX_MODIFIERS_PER_LINE).is_ok());
        assert!(validate_modifier_count(MAX_MODIFIERS_PER_LINE + 1).is_err());
    }
}
