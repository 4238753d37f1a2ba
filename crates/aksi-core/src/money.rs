//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A 20% surcharge on 333.35 is 66.67 exactly once we agree on how the    │
//! │  half kopiyka rounds. Floats never agree twice.                         │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (kopiyky)                            │
//! │    33335 × 2000 bps / 10000 = 6667 (half away from zero)               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use aksi_core::money::Money;
//! use aksi_core::types::Rate;
//!
//! let price = Money::from_minor(10000); // 100.00
//! let doubled = price * 2i64;           // 200.00
//! let surcharge = doubled.percentage(Rate::from_percent(20));
//! assert_eq!(surcharge.minor(), 4000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::types::{Rate, BPS_PER_WHOLE};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (kopiyky for UAH).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for reduction modifiers
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **No float constructor**: There is deliberately no `from_f64`
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  CatalogItem.unit_price ──► LineItem.unit_price ──► LineBreakdown.base │
/// │                                                                         │
/// │  LineBreakdown.subtotal ──► items_subtotal ──► urgency / discount      │
/// │                                                   │                     │
/// │                                                   ▼                     │
/// │                                          PriceBreakdown.total          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use aksi_core::money::Money;
    ///
    /// let price = Money::from_minor(1099); // 10.99
    /// assert_eq!(price.minor(), 1099);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use aksi_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(29900); // 299.00 per coat
    /// assert_eq!(unit_price.multiply_quantity(3).minor(), 89700);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Floors the value at zero.
    ///
    /// Item subtotals and the order total are never allowed below zero, even
    /// when reduction modifiers or discounts exceed the amount they apply to.
    #[inline]
    pub const fn clamp_non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Computes `self × rate`, rounded half away from zero to the minor unit.
    ///
    /// ## Rounding Rule
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  ROUND HALF AWAY FROM ZERO                                          │
    /// │                                                                     │
    /// │   0.5 →  1     1.5 →  2     2.5 →  3                               │
    /// │  -0.5 → -1    -1.5 → -2    -2.5 → -3                               │
    /// │                                                                     │
    /// │  The product is formed once in i128 and divided once. No           │
    /// │  intermediate ratio is ever rounded.                               │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// ## Example
    /// ```rust
    /// use aksi_core::money::Money;
    /// use aksi_core::types::Rate;
    ///
    /// // 0.25 × 50% = 0.125 → 0.13
    /// assert_eq!(Money::from_minor(25).percentage(Rate::from_percent(50)).minor(), 13);
    /// // -0.25 × 50% = -0.125 → -0.13
    /// assert_eq!(Money::from_minor(-25).percentage(Rate::from_percent(50)).minor(), -13);
    /// ```
    pub fn percentage(&self, rate: Rate) -> Money {
        let product = self.0 as i128 * rate.bps() as i128;
        let divisor = BPS_PER_WHOLE as i128;
        let quotient = product / divisor;
        let remainder = product % divisor;

        // remainder carries the sign of product
        let rounded = if remainder.abs() * 2 >= divisor {
            quotient + product.signum()
        } else {
            quotient
        };

        let saturated = if rounded < 0 { i64::MIN } else { i64::MAX };
        let minor = i64::try_from(rounded).unwrap_or(saturated);
        Money::from_minor(minor)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly display. Localised formatting belongs to the frontend.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₴{}.{:02}", sign, self.major().abs(), self.minor_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
