//! # aksi-core: Pure Pricing Logic for Aksi Order Intake
//!
//! This crate is the **heart** of the order price calculator. It contains the
//! pricing model and the calculation algorithm as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Aksi Order Pricing                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Order Wizard (frontend)                      │   │
//! │  │    Item step ──► Modifiers step ──► Parameters step ──► Total  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ cart snapshots                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    aksi-recalc (scheduler)                      │   │
//! │  │    signature, single-flight, last-signature-wins, publish      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ compute_breakdown(&cart)               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ aksi-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │  pricing  │  │   │
//! │  │   │  Rate     │  │   Money   │  │   Cart    │  │ Breakdown │  │   │
//! │  │   │ Category  │  │ rounding  │  │ LineItem  │  │ algorithm │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CLOCK • NO NETWORK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Rate, CategoryCode, modifiers, urgency, discount)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`catalog`] - Read-only price-list lookups
//! - [`cart`] - Cart and line items with validated edits
//! - [`pricing`] - The calculation algorithm and breakdown types
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: `compute_breakdown` is deterministic - same cart = same breakdown
//! 2. **No I/O**: Database, network, file system and clock access are FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in minor units (i64)
//! 4. **Explicit Errors**: Invalid edits are typed errors, never panics or silent drops
//!
//! ## Example Usage
//!
//! ```rust
//! use aksi_core::{compute_breakdown, Cart, CatalogItem, CategoryCode, InMemoryCatalog, LineItem, Money};
//!
//! let catalog = InMemoryCatalog::new()
//!     .with_item(CatalogItem {
//!         id: "coat".to_string(),
//!         name: "Wool coat".to_string(),
//!         unit_price: Money::from_minor(10000),
//!         category: CategoryCode::ClothingCleaning,
//!     })
//!     .unwrap();
//!
//! let mut cart = Cart::new();
//! cart.add_item(LineItem::create(&catalog, "coat", 2, &[]).unwrap()).unwrap();
//!
//! assert_eq!(compute_breakdown(&cart).total.minor(), 20000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{AppliedModifier, Cart, LineItem};
pub use catalog::{CatalogReference, InMemoryCatalog};
pub use error::{CoreError, CoreResult, ValidationError, ValidationResult};
pub use money::Money;
pub use pricing::{compute_breakdown, settle_total, LineBreakdown, ModifierAmount, PriceBreakdown};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single cart
///
/// ## Business Reason
/// Prevents runaway orders and keeps a single receipt printable.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line item
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum catalog unit price and fixed modifier amount, in minor units
/// (10,000,000.00).
///
/// ## Business Reason
/// Keeps every line, subtotal and total of a full cart inside `i64`.
pub const MAX_UNIT_PRICE_MINOR: i64 = 1_000_000_000;

/// Maximum modifiers applied to a single line item
pub const MAX_MODIFIERS_PER_LINE: usize = 20;
