//! # Error Types
//!
//! Domain-specific error types for aksi-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  aksi-core errors (this file)                                          │
//! │  ├── CoreError        - Catalog and cart rule violations               │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  aksi-recalc errors (separate crate)                                   │
//! │  ├── ComputeError     - Delegated computation failures (published)     │
//! │  └── RecalcError      - Scheduler / configuration failures             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → rejected edit (cart unchanged)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation errors never reach the calculation algorithm: every cart the
//! algorithm sees has already passed construction-time checks.

use thiserror::Error;

use crate::types::CategoryCode;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised while building or editing a cart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Price-list item cannot be found in the catalog.
    #[error("Catalog item not found: {0}")]
    CatalogItemNotFound(String),

    /// Modifier code is unknown to the catalog.
    #[error("Modifier not found: {0}")]
    ModifierNotFound(String),

    /// Modifier exists but is not permitted for the item's category.
    ///
    /// ## User Workflow
    /// ```text
    /// Item: Leather jacket (LEATHER_CLEANING)
    ///      │
    ///      ▼
    /// Toggle modifier "WEDDING_DRESS" (only CLOTHING_CLEANING)
    ///      │
    ///      ▼
    /// ModifierNotApplicable { code: "WEDDING_DRESS", category: LeatherCleaning }
    ///      │
    ///      ▼
    /// UI keeps the previous modifier selection
    /// ```
    #[error("Modifier {code} cannot be applied to category {category}")]
    ModifierNotApplicable { code: String, category: CategoryCode },

    /// Line item id is not present in the cart.
    #[error("Line item not found: {0}")]
    LineItemNotFound(String),

    /// Cart has exceeded maximum allowed items.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. unknown category code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g. the same modifier twice on one item).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;
