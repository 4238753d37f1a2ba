//! # Cart Model
//!
//! The order-in-progress: line items plus order-level modifiers.
//!
//! ## Edit Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Edits                                           │
//! │                                                                         │
//! │  Wizard Action            Cart Method              Effect               │
//! │  ─────────────            ───────────              ──────               │
//! │                                                                         │
//! │  Add item ───────────────► add_item(item) ────────► items.push(item)   │
//! │                                                                         │
//! │  Change qty / modifiers ─► replace_item(item') ───► items[i] = item'   │
//! │    (item' built with LineItem::with_quantity / with_modifiers)          │
//! │                                                                         │
//! │  Remove item ────────────► remove_item(id) ───────► items.remove(i)    │
//! │                                                                         │
//! │  Urgency / discount ─────► set_global_modifiers() ► replaced whole     │
//! │                                                                         │
//! │  NOTE: A LineItem is never mutated in place. Every edit either          │
//! │        replaces a whole value or is rejected with the cart unchanged.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Price Freezing
//! Unit price, category and modifier definitions are copied from the catalog
//! when a line item is built. Later price-list changes do not leak into an
//! order that is already being edited.

use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use crate::catalog::CatalogReference;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CategoryCode, GlobalModifiers, ModifierCode, ModifierKind};
use crate::validation::{
    validate_cart_size, validate_identifier, validate_modifier_count, validate_modifier_kind,
    validate_quantity, validate_unit_price_minor,
};
use crate::MAX_CART_ITEMS;

// =============================================================================
// Applied Modifier
// =============================================================================

/// A modifier attached to a line, frozen from its catalog definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedModifier {
    pub code: ModifierCode,
    pub kind: ModifierKind,
}

// =============================================================================
// Line Item
// =============================================================================

/// One garment/service line of the order.
///
/// ## Invariants
/// - `1 <= quantity <= MAX_ITEM_QUANTITY`
/// - every applied modifier is permitted for `category`
/// - applied modifier codes are unique and keep insertion order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    id: String,
    catalog_item_id: String,
    quantity: i64,
    unit_price: Money,
    category: CategoryCode,
    applied_modifiers: Vec<AppliedModifier>,
}

impl LineItem {
    /// Builds a line item with a fresh UUID.
    pub fn create<C>(
        catalog: &C,
        catalog_item_id: &str,
        quantity: i64,
        modifier_codes: &[ModifierCode],
    ) -> CoreResult<Self>
    where
        C: CatalogReference + ?Sized,
    {
        Self::resolve(
            catalog,
            Uuid::new_v4().to_string(),
            catalog_item_id,
            quantity,
            modifier_codes,
        )
    }

    /// Builds a line item with a caller-chosen id.
    ///
    /// Resolves the unit price and category of `catalog_item_id` and every
    /// modifier code. The first failing check is returned.
    pub fn resolve<C>(
        catalog: &C,
        id: impl Into<String>,
        catalog_item_id: &str,
        quantity: i64,
        modifier_codes: &[ModifierCode],
    ) -> CoreResult<Self>
    where
        C: CatalogReference + ?Sized,
    {
        let id = id.into();
        validate_identifier("line item id", &id)?;
        validate_quantity(quantity)?;

        let catalog_item = catalog.resolve_item(catalog_item_id)?;
        validate_unit_price_minor(catalog_item.unit_price.minor())?;
        let applied_modifiers =
            resolve_modifiers(catalog, catalog_item.category, modifier_codes)?;

        Ok(LineItem {
            id,
            catalog_item_id: catalog_item.id,
            quantity,
            unit_price: catalog_item.unit_price,
            category: catalog_item.category,
            applied_modifiers,
        })
    }

    /// Returns a copy with a different quantity.
    pub fn with_quantity(&self, quantity: i64) -> CoreResult<Self> {
        validate_quantity(quantity)?;
        Ok(LineItem {
            quantity,
            ..self.clone()
        })
    }

    /// Returns a copy with a different modifier selection, in the given order.
    pub fn with_modifiers<C>(&self, catalog: &C, modifier_codes: &[ModifierCode]) -> CoreResult<Self>
    where
        C: CatalogReference + ?Sized,
    {
        let applied_modifiers = resolve_modifiers(catalog, self.category, modifier_codes)?;
        Ok(LineItem {
            applied_modifiers,
            ..self.clone()
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn catalog_item_id(&self) -> &str {
        &self.catalog_item_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn category(&self) -> CategoryCode {
        self.category
    }

    pub fn applied_modifiers(&self) -> &[AppliedModifier] {
        &self.applied_modifiers
    }

    /// Applied modifier codes in application order.
    pub fn modifier_codes(&self) -> impl Iterator<Item = &ModifierCode> {
        self.applied_modifiers.iter().map(|m| &m.code)
    }
}

/// Resolves and checks a modifier selection for one category.
fn resolve_modifiers<C>(
    catalog: &C,
    category: CategoryCode,
    codes: &[ModifierCode],
) -> CoreResult<Vec<AppliedModifier>>
where
    C: CatalogReference + ?Sized,
{
    validate_modifier_count(codes.len())?;

    let mut seen = HashSet::with_capacity(codes.len());
    let mut applied = Vec::with_capacity(codes.len());

    for code in codes {
        if !seen.insert(code) {
            return Err(ValidationError::Duplicate {
                field: "modifier code".to_string(),
                value: code.to_string(),
            }
            .into());
        }

        let definition = catalog.resolve_modifier(code)?;
        validate_modifier_kind(&definition.kind)?;
        if !definition.is_applicable_to(category) {
            return Err(CoreError::ModifierNotApplicable {
                code: code.to_string(),
                category,
            });
        }

        applied.push(AppliedModifier {
            code: definition.code,
            kind: definition.kind,
        });
    }

    Ok(applied)
}

// =============================================================================
// Cart
// =============================================================================

/// The order being priced.
///
/// ## Invariants
/// - Line item ids are unique
/// - At most MAX_CART_ITEMS lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    id: String,
    items: Vec<LineItem>,
    global_modifiers: GlobalModifiers,
}

impl Cart {
    /// Creates a new empty cart with a fresh UUID.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    /// Creates a new empty cart with a caller-chosen id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Cart {
            id: id.into(),
            items: Vec::new(),
            global_modifiers: GlobalModifiers::default(),
        }
    }

    /// Builds a cart from parts, enforcing the same rules as the edit methods.
    pub fn from_parts(
        id: impl Into<String>,
        items: impl IntoIterator<Item = LineItem>,
        global_modifiers: GlobalModifiers,
    ) -> CoreResult<Self> {
        let mut cart = Cart::with_id(id);
        for item in items {
            cart.add_item(item)?;
        }
        cart.global_modifiers = global_modifiers;
        Ok(cart)
    }

    /// Appends a line item.
    ///
    /// ## Returns
    /// - `Err(CartTooLarge)` when the cart is full
    /// - `Err(Validation(Duplicate))` when the line id is already present
    pub fn add_item(&mut self, item: LineItem) -> CoreResult<()> {
        validate_cart_size(self.items.len()).map_err(|_| CoreError::CartTooLarge {
            max: MAX_CART_ITEMS,
        })?;

        if self.position(item.id()).is_some() {
            return Err(ValidationError::Duplicate {
                field: "line item id".to_string(),
                value: item.id().to_string(),
            }
            .into());
        }

        self.items.push(item);
        Ok(())
    }

    /// Replaces the line with the same id, keeping its position.
    pub fn replace_item(&mut self, item: LineItem) -> CoreResult<()> {
        let index = self
            .position(item.id())
            .ok_or_else(|| CoreError::LineItemNotFound(item.id().to_string()))?;
        self.items[index] = item;
        Ok(())
    }

    /// Removes and returns a line item.
    pub fn remove_item(&mut self, item_id: &str) -> CoreResult<LineItem> {
        let index = self
            .position(item_id)
            .ok_or_else(|| CoreError::LineItemNotFound(item_id.to_string()))?;
        Ok(self.items.remove(index))
    }

    /// Replaces the urgency/discount selection as a whole.
    pub fn set_global_modifiers(&mut self, global_modifiers: GlobalModifiers) {
        self.global_modifiers = global_modifiers;
    }

    /// Removes all items and resets order-level modifiers.
    pub fn clear(&mut self) {
        self.items.clear();
        self.global_modifiers = GlobalModifiers::default();
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn item(&self, item_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id() == item_id)
    }

    pub fn global_modifiers(&self) -> &GlobalModifiers {
        &self.global_modifiers
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Total number of garments across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, item_id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.id() == item_id)
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::types::{CatalogItem, ModifierDefinition, Rate};

    fn code(raw: &str) -> ModifierCode {
        ModifierCode::parse(raw).unwrap()
    }

    fn test_catalog() -> InMemoryCatalog {
        InMemoryCatalog::new()
            .with_item(CatalogItem {
                id: "dress".to_string(),
                name: "Dress".to_string(),
                unit_price: Money::from_minor(30000),
                category: CategoryCode::ClothingCleaning,
            })
            .unwrap()
            .with_item(CatalogItem {
                id: "jacket-leather".to_string(),
                name: "Leather jacket".to_string(),
                unit_price: Money::from_minor(90000),
                category: CategoryCode::LeatherCleaning,
            })
            .unwrap()
            .with_modifier(
                ModifierDefinition::percentage(code("WEDDING_DRESS"), "Wedding dress", Rate::from_percent(30))
                    .only_for([CategoryCode::ClothingCleaning]),
            )
            .unwrap()
            .with_modifier(ModifierDefinition::percentage(
                code("HEAVY_SOILING"),
                "Heavy soiling",
                Rate::from_percent(20),
            ))
            .unwrap()
    }

    /// A price list that hands out whatever it holds, unchecked.
    struct UncheckedCatalog {
        item: CatalogItem,
        modifier: ModifierDefinition,
    }

    impl CatalogReference for UncheckedCatalog {
        fn resolve_item(&self, _: &str) -> CoreResult<CatalogItem> {
            Ok(self.item.clone())
        }

        fn resolve_modifier(&self, _: &ModifierCode) -> CoreResult<ModifierDefinition> {
            Ok(self.modifier.clone())
        }

        fn applicable_modifiers(&self, _: CategoryCode) -> Vec<ModifierDefinition> {
            vec![self.modifier.clone()]
        }
    }

    #[test]
    fn test_line_item_freezes_catalog_data() {
        let catalog = test_catalog();
        let item = LineItem::resolve(&catalog, "l1", "dress", 2, &[code("HEAVY_SOILING")]).unwrap();

        assert_eq!(item.unit_price().minor(), 30000);
        assert_eq!(item.category(), CategoryCode::ClothingCleaning);
        assert_eq!(
            item.applied_modifiers()[0].kind,
            ModifierKind::Percentage(Rate::from_percent(20))
        );
    }

    #[test]
    fn test_line_item_rejects_invalid_quantity() {
        let catalog = test_catalog();
        assert!(matches!(
            LineItem::resolve(&catalog, "l1", "dress", 0, &[]),
            Err(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));

        let item = LineItem::resolve(&catalog, "l1", "dress", 1, &[]).unwrap();
        assert!(item.with_quantity(-1).is_err());
        assert_eq!(item.with_quantity(4).unwrap().quantity(), 4);
        assert_eq!(item.quantity(), 1);
    }

    #[test]
    fn test_line_item_rejects_restricted_modifier() {
        let catalog = test_catalog();
        let result = LineItem::resolve(&catalog, "l1", "jacket-leather", 1, &[code("WEDDING_DRESS")]);
        assert_eq!(
            result.unwrap_err(),
            CoreError::ModifierNotApplicable {
                code: "WEDDING_DRESS".to_string(),
                category: CategoryCode::LeatherCleaning,
            }
        );
    }

    #[test]
    fn test_line_item_rejects_unknown_and_duplicate_modifiers() {
        let catalog = test_catalog();
        assert!(matches!(
            LineItem::resolve(&catalog, "l1", "dress", 1, &[code("GOLD_THREAD")]),
            Err(CoreError::ModifierNotFound(_))
        ));
        assert!(matches!(
            LineItem::resolve(&catalog, "l1", "dress", 1, &[code("HEAVY_SOILING"), code("HEAVY_SOILING")]),
            Err(CoreError::Validation(ValidationError::Duplicate { .. }))
        ));
        assert!(matches!(
            LineItem::resolve(&catalog, "l1", "hat", 1, &[]),
            Err(CoreError::CatalogItemNotFound(_))
        ));
    }

    #[test]
    fn test_line_item_rejects_out_of_range_catalog_data() {
        let unchecked = UncheckedCatalog {
            item: CatalogItem {
                id: "sail".to_string(),
                name: "Sail".to_string(),
                unit_price: Money::from_minor(i64::MAX / 2),
                category: CategoryCode::TextileDyeing,
            },
            modifier: ModifierDefinition::percentage(
                code("GOLD_THREAD"),
                "Gold thread",
                Rate::from_bps(i64::MAX / 2),
            ),
        };
        let err = LineItem::resolve(&unchecked, "l1", "sail", 3, &[]).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::OutOfRange { .. })));

        let unchecked = UncheckedCatalog {
            item: CatalogItem {
                unit_price: Money::from_minor(10000),
                ..unchecked.item
            },
            ..unchecked
        };
        let err = LineItem::resolve(&unchecked, "l1", "sail", 1, &[code("GOLD_THREAD")]).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::OutOfRange { .. })));
    }

    #[test]
    fn test_line_item_rejects_too_many_modifiers() {
        let codes: Vec<ModifierCode> = (0..=crate::MAX_MODIFIERS_PER_LINE)
            .map(|i| code(&format!("EXTRA_{}", i)))
            .collect();
        let err = LineItem::resolve(&test_catalog(), "l1", "dress", 1, &codes).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::OutOfRange { .. })));
    }

    #[test]
    fn test_with_modifiers_keeps_order() {
        let catalog = test_catalog();
        let item = LineItem::resolve(&catalog, "l1", "dress", 1, &[]).unwrap();
        let edited = item
            .with_modifiers(&catalog, &[code("WEDDING_DRESS"), code("HEAVY_SOILING")])
            .unwrap();
        let codes: Vec<_> = edited.modifier_codes().map(|c| c.as_str()).collect();
        assert_eq!(codes, vec!["WEDDING_DRESS", "HEAVY_SOILING"]);
    }

    #[test]
    fn test_cart_rejects_duplicate_ids() {
        let catalog = test_catalog();
        let mut cart = Cart::with_id("order-1");
        cart.add_item(LineItem::resolve(&catalog, "l1", "dress", 1, &[]).unwrap())
            .unwrap();

        let duplicate = LineItem::resolve(&catalog, "l1", "jacket-leather", 1, &[]).unwrap();
        assert!(cart.add_item(duplicate).is_err());
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.items()[0].catalog_item_id(), "dress");
    }

    #[test]
    fn test_cart_replace_and_remove() {
        let catalog = test_catalog();
        let mut cart = Cart::with_id("order-1");
        let item = LineItem::create(&catalog, "dress", 1, &[]).unwrap();
        let item_id = item.id().to_string();
        cart.add_item(item).unwrap();

        let updated = cart.item(&item_id).unwrap().with_quantity(3).unwrap();
        cart.replace_item(updated).unwrap();
        assert_eq!(cart.total_quantity(), 3);

        let orphan = LineItem::resolve(&catalog, "other", "dress", 1, &[]).unwrap();
        assert!(matches!(cart.replace_item(orphan), Err(CoreError::LineItemNotFound(_))));

        cart.remove_item(&item_id).unwrap();
        assert!(cart.is_empty());
        assert!(cart.remove_item(&item_id).is_err());
    }

    #[test]
    fn test_cart_size_limit() {
        let catalog = test_catalog();
        let mut cart = Cart::with_id("big");
        for i in 0..MAX_CART_ITEMS {
            cart.add_item(LineItem::resolve(&catalog, format!("l{}", i), "dress", 1, &[]).unwrap())
                .unwrap();
        }
        let one_more = LineItem::resolve(&catalog, "overflow", "dress", 1, &[]).unwrap();
        assert_eq!(
            cart.add_item(one_more).unwrap_err(),
            CoreError::CartTooLarge { max: MAX_CART_ITEMS }
        );
    }
}
