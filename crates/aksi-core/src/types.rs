//! # Domain Types
//!
//! Value types shared by the catalog, the cart and the calculator.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────────┐   ┌─────────────────┐  │
//! │  │   CatalogItem   │   │  ModifierDefinition  │   │ GlobalModifiers │  │
//! │  │  ─────────────  │   │  ──────────────────  │   │  ─────────────  │  │
//! │  │  id             │   │  code (ModifierCode) │   │  urgency        │  │
//! │  │  unit_price     │   │  kind  (% | fixed)   │   │  discount       │  │
//! │  │  category       │   │  applicability       │   │                 │  │
//! │  └─────────────────┘   └──────────────────────┘   └─────────────────┘  │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌──────────────────────┐  │
//! │  │      Rate       │   │  CategoryCode   │   │  DiscountSelection   │  │
//! │  │  bps (i64)      │   │  closed enum    │   │  kind + percentage   │  │
//! │  │  2000 = 20%     │   │  3 restricted   │   │  always in [0, 100]  │  │
//! │  └─────────────────┘   └─────────────────┘   └──────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Codes that arrive as strings (category codes, modifier codes, urgency and
//! discount names) are parsed into these types at the boundary. Anything that
//! does not parse is rejected there, never silently ignored downstream.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{ValidationError, ValidationResult};
use crate::money::Money;
use crate::validation::{validate_discount_percent, validate_modifier_code};

/// Basis points in 100%.
pub const BPS_PER_WHOLE: i64 = 10_000;

// =============================================================================
// Rate
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01%. 2000 bps = 20%. Keeping the rate integral means a
/// percentage amount is produced by a single integer division, so the
/// rounding rule is applied exactly once.
///
/// Signed: price-list modifiers may reduce a price (e.g. -30% for children's
/// items).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(i64);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: i64) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a whole percentage.
    #[inline]
    pub const fn from_percent(percent: i64) -> Self {
        Rate(percent.saturating_mul(100))
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        if abs % 100 == 0 {
            write!(f, "{}{}%", sign, abs / 100)
        } else {
            let fraction = format!("{:02}", abs % 100);
            write!(f, "{}{}.{}%", sign, abs / 100, fraction.trim_end_matches('0'))
        }
    }
}

// =============================================================================
// Category Code
// =============================================================================

/// Service category of a price-list item.
///
/// ## Discount Restrictions
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Category              Order discount applies?                          │
/// │  ────────────────────  ──────────────────────                          │
/// │  CLOTHING_CLEANING     yes                                              │
/// │  LEATHER_CLEANING      yes                                              │
/// │  PADDING               yes                                              │
/// │  FUR                   yes                                              │
/// │  ADDITIONAL_SERVICES   yes                                              │
/// │  LAUNDRY               NO  (restricted)                                 │
/// │  IRONING               NO  (restricted)                                 │
/// │  TEXTILE_DYEING        NO  (restricted)                                 │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryCode {
    ClothingCleaning,
    LeatherCleaning,
    Padding,
    Fur,
    TextileDyeing,
    Laundry,
    Ironing,
    AdditionalServices,
}

impl CategoryCode {
    /// Every category, in price-list order.
    pub const ALL: [CategoryCode; 8] = [
        CategoryCode::ClothingCleaning,
        CategoryCode::LeatherCleaning,
        CategoryCode::Padding,
        CategoryCode::Fur,
        CategoryCode::TextileDyeing,
        CategoryCode::Laundry,
        CategoryCode::Ironing,
        CategoryCode::AdditionalServices,
    ];

    /// Returns true if order-level discounts never apply to this category.
    pub const fn is_discount_restricted(&self) -> bool {
        matches!(
            self,
            CategoryCode::Laundry | CategoryCode::Ironing | CategoryCode::TextileDyeing
        )
    }

    /// Wire code, e.g. `"LEATHER_CLEANING"`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            CategoryCode::ClothingCleaning => "CLOTHING_CLEANING",
            CategoryCode::LeatherCleaning => "LEATHER_CLEANING",
            CategoryCode::Padding => "PADDING",
            CategoryCode::Fur => "FUR",
            CategoryCode::TextileDyeing => "TEXTILE_DYEING",
            CategoryCode::Laundry => "LAUNDRY",
            CategoryCode::Ironing => "IRONING",
            CategoryCode::AdditionalServices => "ADDITIONAL_SERVICES",
        }
    }
}

impl fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        CategoryCode::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "category".to_string(),
                reason: format!("unknown category code '{}'", s),
            })
    }
}

// =============================================================================
// Modifier Code
// =============================================================================

/// Validated identifier of a price modifier, e.g. `"HEAVY_SOILING"`.
///
/// Stored upper-cased. Construction goes through [`validate_modifier_code`],
/// so a `ModifierCode` value is always well-formed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModifierCode(String);

impl ModifierCode {
    /// Parses and normalises a raw modifier code.
    pub fn parse(raw: &str) -> ValidationResult<Self> {
        let normalized = raw.trim().to_uppercase();
        validate_modifier_code(&normalized)?;
        Ok(ModifierCode(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModifierCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ModifierCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ModifierCode::parse(&value)
    }
}

impl From<ModifierCode> for String {
    fn from(code: ModifierCode) -> Self {
        code.0
    }
}

impl FromStr for ModifierCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModifierCode::parse(s)
    }
}

// =============================================================================
// Modifier Definition
// =============================================================================

/// How a modifier changes a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModifierKind {
    /// Percentage of the line base (`unit_price × quantity`).
    Percentage(Rate),
    /// Flat amount per line, independent of quantity.
    Fixed(Money),
}

/// Which categories a modifier may be applied to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierApplicability {
    /// Applies to every category.
    All,
    /// Applies only to the listed categories. An empty set means all.
    Only(BTreeSet<CategoryCode>),
}

impl ModifierApplicability {
    pub fn allows(&self, category: CategoryCode) -> bool {
        match self {
            ModifierApplicability::All => true,
            ModifierApplicability::Only(set) => set.is_empty() || set.contains(&category),
        }
    }
}

/// A modifier as published by the price list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierDefinition {
    pub code: ModifierCode,
    pub display_name: String,
    pub kind: ModifierKind,
    pub applicability: ModifierApplicability,
}

impl ModifierDefinition {
    /// Creates a percentage modifier applicable to every category.
    pub fn percentage(code: ModifierCode, display_name: impl Into<String>, rate: Rate) -> Self {
        ModifierDefinition {
            code,
            display_name: display_name.into(),
            kind: ModifierKind::Percentage(rate),
            applicability: ModifierApplicability::All,
        }
    }

    /// Creates a fixed per-line modifier applicable to every category.
    pub fn fixed(code: ModifierCode, display_name: impl Into<String>, amount: Money) -> Self {
        ModifierDefinition {
            code,
            display_name: display_name.into(),
            kind: ModifierKind::Fixed(amount),
            applicability: ModifierApplicability::All,
        }
    }

    /// Restricts the modifier to the given categories.
    pub fn only_for(mut self, categories: impl IntoIterator<Item = CategoryCode>) -> Self {
        self.applicability = ModifierApplicability::Only(categories.into_iter().collect());
        self
    }

    pub fn is_applicable_to(&self, category: CategoryCode) -> bool {
        self.applicability.allows(category)
    }
}

// =============================================================================
// Catalog Item
// =============================================================================

/// A price-list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub unit_price: Money,
    pub category: CategoryCode,
}

// =============================================================================
// Urgency
// =============================================================================

/// Order execution urgency. Fixed surcharge table, not user-editable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum UrgencyLevel {
    #[default]
    #[serde(rename = "NORMAL")]
    Normal,
    #[serde(rename = "EXPRESS_48H")]
    Express48h,
    #[serde(rename = "EXPRESS_24H")]
    Express24h,
}

impl UrgencyLevel {
    /// Surcharge applied to the items subtotal.
    pub const fn rate(&self) -> Rate {
        match self {
            UrgencyLevel::Normal => Rate::zero(),
            UrgencyLevel::Express48h => Rate::from_percent(50),
            UrgencyLevel::Express24h => Rate::from_percent(100),
        }
    }
}

impl FromStr for UrgencyLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NORMAL" => Ok(UrgencyLevel::Normal),
            "EXPRESS_48H" => Ok(UrgencyLevel::Express48h),
            "EXPRESS_24H" => Ok(UrgencyLevel::Express24h),
            other => Err(ValidationError::InvalidFormat {
                field: "urgency".to_string(),
                reason: format!("unknown urgency level '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Discount
// =============================================================================

/// Discount programmes with a canonical percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountScheme {
    /// Loyalty card holders.
    Evercard,
    /// Customers arriving through social media promotions.
    SocialMedia,
    /// Armed forces personnel.
    Military,
}

impl DiscountScheme {
    pub const fn percent(&self) -> i64 {
        match self {
            DiscountScheme::Evercard => 10,
            DiscountScheme::SocialMedia => 5,
            DiscountScheme::Military => 10,
        }
    }
}

/// Kind of order-level discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscountKind {
    None,
    Scheme(DiscountScheme),
    Custom,
}

/// The order's discount choice.
///
/// ## Invariant
/// `percentage` is always present and always within `[0, 100]`:
/// - `None` forces 0
/// - a scheme carries its canonical percentage
/// - `Custom` must be given one explicitly
///
/// Fields are private; deserialisation goes through the same checks as the
/// constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "DiscountSelectionRepr", into = "DiscountSelectionRepr")]
pub struct DiscountSelection {
    kind: DiscountKind,
    percentage: Rate,
}

impl DiscountSelection {
    /// No discount.
    pub const fn none() -> Self {
        DiscountSelection {
            kind: DiscountKind::None,
            percentage: Rate::zero(),
        }
    }

    /// A fixed discount programme.
    pub const fn scheme(scheme: DiscountScheme) -> Self {
        DiscountSelection {
            kind: DiscountKind::Scheme(scheme),
            percentage: Rate::from_percent(scheme.percent()),
        }
    }

    /// A custom whole-number percentage in `[0, 100]`.
    pub fn custom(percent: i64) -> ValidationResult<Self> {
        validate_discount_percent(percent)?;
        Ok(DiscountSelection {
            kind: DiscountKind::Custom,
            percentage: Rate::from_percent(percent),
        })
    }

    pub const fn kind(&self) -> DiscountKind {
        self.kind
    }

    pub const fn percentage(&self) -> Rate {
        self.percentage
    }

    pub const fn is_none(&self) -> bool {
        matches!(self.kind, DiscountKind::None)
    }
}

impl Default for DiscountSelection {
    fn default() -> Self {
        DiscountSelection::none()
    }
}

/// Wire shape: `{ "kind": "EVERCARD", "percentage": 10 }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DiscountSelectionRepr {
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    percentage: Option<i64>,
}

impl TryFrom<DiscountSelectionRepr> for DiscountSelection {
    type Error = ValidationError;

    fn try_from(repr: DiscountSelectionRepr) -> Result<Self, Self::Error> {
        let selection = match repr.kind.trim().to_uppercase().as_str() {
            "NONE" => DiscountSelection::none(),
            "EVERCARD" => DiscountSelection::scheme(DiscountScheme::Evercard),
            "SOCIAL_MEDIA" => DiscountSelection::scheme(DiscountScheme::SocialMedia),
            "MILITARY" => DiscountSelection::scheme(DiscountScheme::Military),
            "CUSTOM" => {
                let percent = repr.percentage.ok_or_else(|| ValidationError::Required {
                    field: "discount percentage".to_string(),
                })?;
                return DiscountSelection::custom(percent);
            }
            other => {
                return Err(ValidationError::InvalidFormat {
                    field: "discount kind".to_string(),
                    reason: format!("unknown discount kind '{}'", other),
                })
            }
        };

        // Non-custom kinds carry their own percentage; a conflicting value is
        // rejected rather than overridden.
        match repr.percentage {
            Some(p) if p != selection.percentage.bps() / 100 => {
                Err(ValidationError::InvalidFormat {
                    field: "discount percentage".to_string(),
                    reason: format!(
                        "{} does not match the {} fixed by the discount kind",
                        p, selection.percentage
                    ),
                })
            }
            _ => Ok(selection),
        }
    }
}

impl From<DiscountSelection> for DiscountSelectionRepr {
    fn from(selection: DiscountSelection) -> Self {
        let kind = match selection.kind {
            DiscountKind::None => "NONE",
            DiscountKind::Scheme(DiscountScheme::Evercard) => "EVERCARD",
            DiscountKind::Scheme(DiscountScheme::SocialMedia) => "SOCIAL_MEDIA",
            DiscountKind::Scheme(DiscountScheme::Military) => "MILITARY",
            DiscountKind::Custom => "CUSTOM",
        };
        DiscountSelectionRepr {
            kind: kind.to_string(),
            percentage: Some(selection.percentage.bps() / 100),
        }
    }
}

// =============================================================================
// Global Modifiers
// =============================================================================

/// Order-level modifiers chosen on the order parameters step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GlobalModifiers {
    #[serde(default)]
    pub urgency: UrgencyLevel,
    #[serde(default)]
    pub discount: DiscountSelection,
}

// =============================================================================
// Unit Tests
// =============================================================================
