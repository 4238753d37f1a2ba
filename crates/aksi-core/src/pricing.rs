//! # Price Calculation
//!
//! `compute_breakdown` turns a [`Cart`] into a [`PriceBreakdown`].
//!
//! ## Calculation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    compute_breakdown(cart)                              │
//! │                                                                         │
//! │  PER LINE                                                               │
//! │    base      = unit_price × quantity                                    │
//! │    modifier  = PERCENTAGE: round(base × rate)   (always against base)   │
//! │                FIXED:      value                (flat per line)         │
//! │    subtotal  = max(0, base + Σ modifier)                                │
//! │                                                                         │
//! │  PER CART                                                               │
//! │    items_subtotal   = Σ subtotal                                        │
//! │    urgency_amount   = round(items_subtotal × urgency rate)              │
//! │    applicable       = Σ subtotal of non-restricted lines                │
//! │    discount_amount  = round(applicable × discount rate)                 │
//! │    total            = max(0, items_subtotal + urgency − discount)       │
//! │                                                                         │
//! │  Every `round` is half away from zero, applied once, in i128.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The function is pure: no I/O, no clock, no catalog access. Everything it
//! reads was frozen into the cart when the line items were built, so the same
//! cart always yields a byte-identical breakdown.

use serde::Serialize;
use ts_rs::TS;

use crate::cart::{Cart, LineItem};
use crate::money::Money;
use crate::types::{CategoryCode, ModifierCode, ModifierKind, Rate, UrgencyLevel};

// =============================================================================
// Breakdown Types
// =============================================================================

/// Amount contributed by one applied modifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ModifierAmount {
    #[ts(as = "String")]
    pub code: ModifierCode,
    pub amount: Money,
}

/// Priced view of one line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineBreakdown {
    pub item_id: String,
    pub catalog_item_id: String,
    pub category: CategoryCode,
    pub quantity: i64,
    pub unit_price: Money,
    /// `unit_price × quantity`.
    pub base: Money,
    /// One entry per applied modifier, in application order.
    pub modifiers: Vec<ModifierAmount>,
    /// `max(0, base + Σ modifiers)`.
    pub subtotal: Money,
    /// False for discount-restricted categories.
    pub discount_eligible: bool,
}

/// Full price breakdown of a cart.
///
/// ## Order Screen
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Wool coat ×2                              ₴200.00                      │
/// │    HEAVY_SOILING                          +₴40.00                       │
/// │                                           ────────                      │
/// │  Items subtotal                            ₴240.00   items_subtotal     │
/// │  Urgency EXPRESS_48H (50%)                +₴120.00   urgency_amount     │
/// │  Discount (10%)                             -₴0.00   discount_amount    │
/// │                                           ════════                      │
/// │  TOTAL                                     ₴360.00   total              │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub cart_id: String,
    pub lines: Vec<LineBreakdown>,
    pub items_subtotal: Money,
    pub urgency: UrgencyLevel,
    pub urgency_rate: Rate,
    pub urgency_amount: Money,
    /// Sum of line subtotals the order discount may apply to.
    pub discount_applicable_amount: Money,
    pub discount_percentage: Rate,
    pub discount_amount: Money,
    /// Lines left out of the discount because of their category.
    /// Empty unless a discount is selected.
    pub discount_excluded_items: Vec<String>,
    pub total: Money,
}

impl PriceBreakdown {
    /// Looks up the priced line for a line item id.
    pub fn line(&self, item_id: &str) -> Option<&LineBreakdown> {
        self.lines.iter().find(|l| l.item_id == item_id)
    }

    /// Total of all modifier amounts across lines (before clamping).
    pub fn modifiers_total(&self) -> Money {
        self.lines
            .iter()
            .flat_map(|l| l.modifiers.iter())
            .map(|m| m.amount)
            .sum()
    }
}

// =============================================================================
// Algorithm
// =============================================================================

/// Computes the price breakdown of a cart.
///
/// ## Example
/// ```rust
/// use aksi_core::{compute_breakdown, Cart};
///
/// let breakdown = compute_breakdown(&Cart::with_id("empty"));
/// assert!(breakdown.total.is_zero());
/// ```
pub fn compute_breakdown(cart: &Cart) -> PriceBreakdown {
    debug_assert!(
        has_unique_ids(cart.items()),
        "cart {} holds duplicate line item ids",
        cart.id()
    );

    let lines: Vec<LineBreakdown> = cart.items().iter().map(price_line).collect();

    let items_subtotal: Money = lines.iter().map(|l| l.subtotal).sum();

    let global = cart.global_modifiers();
    let urgency_rate = global.urgency.rate();
    let urgency_amount = items_subtotal.percentage(urgency_rate);

    let discount_applicable_amount: Money = lines
        .iter()
        .filter(|l| l.discount_eligible)
        .map(|l| l.subtotal)
        .sum();

    let discount_percentage = global.discount.percentage();
    let (discount_amount, discount_excluded_items) = if global.discount.is_none() {
        (Money::zero(), Vec::new())
    } else {
        let excluded = lines
            .iter()
            .filter(|l| !l.discount_eligible)
            .map(|l| l.item_id.clone())
            .collect();
        (discount_applicable_amount.percentage(discount_percentage), excluded)
    };

    PriceBreakdown {
        cart_id: cart.id().to_string(),
        lines,
        items_subtotal,
        urgency: global.urgency,
        urgency_rate,
        urgency_amount,
        discount_applicable_amount,
        discount_percentage,
        discount_amount,
        discount_excluded_items,
        total: settle_total(items_subtotal, urgency_amount, discount_amount),
    }
}

/// `max(0, items_subtotal + urgency − discount)`.
pub fn settle_total(items_subtotal: Money, urgency_amount: Money, discount_amount: Money) -> Money {
    (items_subtotal + urgency_amount - discount_amount).clamp_non_negative()
}

fn price_line(item: &LineItem) -> LineBreakdown {
    let base = item.unit_price().multiply_quantity(item.quantity());

    let modifiers: Vec<ModifierAmount> = item
        .applied_modifiers()
        .iter()
        .map(|applied| ModifierAmount {
            code: applied.code.clone(),
            amount: match applied.kind {
                ModifierKind::Percentage(rate) => base.percentage(rate),
                ModifierKind::Fixed(amount) => amount,
            },
        })
        .collect();

    let subtotal = (base + modifiers.iter().map(|m| m.amount).sum::<Money>()).clamp_non_negative();

    LineBreakdown {
        item_id: item.id().to_string(),
        catalog_item_id: item.catalog_item_id().to_string(),
        category: item.category(),
        quantity: item.quantity(),
        unit_price: item.unit_price(),
        base,
        modifiers,
        subtotal,
        discount_eligible: !item.category().is_discount_restricted(),
    }
}

fn has_unique_ids(items: &[LineItem]) -> bool {
    let mut seen = std::collections::HashSet::with_capacity(items.len());
    items.iter().all(|i| seen.insert(i.id()))
}

// =============================================================================
// Unit Tests
// =============================================================================
