//! # Catalog Reference
//!
//! Read-only view of the price list: items (id → unit price, category) and
//! modifier definitions (code → kind, value, category restrictions).
//!
//! The price-list service owns this data. aksi-core only consumes it through
//! [`CatalogReference`], at the moment an item enters the cart; after that the
//! line item carries its own frozen copy.
//!
//! [`InMemoryCatalog`] is the implementation used by tests and by the CLI,
//! which loads it from a TOML price list.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CatalogItem, CategoryCode, ModifierCode, ModifierDefinition};
use crate::validation::{validate_identifier, validate_modifier_kind, validate_unit_price_minor};

/// Lookups the cart needs from the price list.
pub trait CatalogReference: Send + Sync {
    /// Resolves a price-list item by id.
    fn resolve_item(&self, catalog_item_id: &str) -> CoreResult<CatalogItem>;

    /// Resolves a modifier definition by code.
    fn resolve_modifier(&self, code: &ModifierCode) -> CoreResult<ModifierDefinition>;

    /// Resolves the base unit price of a price-list item.
    fn resolve_unit_price(&self, catalog_item_id: &str) -> CoreResult<Money> {
        self.resolve_item(catalog_item_id).map(|item| item.unit_price)
    }

    /// Returns true if order discounts never apply to the category.
    fn is_discount_restricted(&self, category: CategoryCode) -> bool {
        category.is_discount_restricted()
    }

    /// Lists the modifiers an item of `category` may carry, general
    /// modifiers included, ordered by code.
    ///
    /// ## User Workflow
    /// ```text
    /// Item wizard: category LEATHER_CLEANING selected
    ///      │
    ///      ▼
    /// applicable_modifiers(LEATHER_CLEANING)
    ///      │
    ///      ▼
    /// Only these toggles are offered; the rest stay hidden
    /// ```
    fn applicable_modifiers(&self, category: CategoryCode) -> Vec<ModifierDefinition>;
}

/// A price list held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    items: HashMap<String, CatalogItem>,
    modifiers: HashMap<ModifierCode, ModifierDefinition>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a price-list item.
    pub fn insert_item(&mut self, item: CatalogItem) -> CoreResult<()> {
        validate_identifier("catalog item id", &item.id)?;
        validate_unit_price_minor(item.unit_price.minor())?;
        self.items.insert(item.id.clone(), item);
        Ok(())
    }

    /// Adds or replaces a modifier definition.
    pub fn insert_modifier(&mut self, modifier: ModifierDefinition) -> CoreResult<()> {
        validate_modifier_kind(&modifier.kind)?;
        self.modifiers.insert(modifier.code.clone(), modifier);
        Ok(())
    }

    /// Builder-style variant of [`insert_item`](Self::insert_item).
    pub fn with_item(mut self, item: CatalogItem) -> CoreResult<Self> {
        self.insert_item(item)?;
        Ok(self)
    }

    /// Builder-style variant of [`insert_modifier`](Self::insert_modifier).
    pub fn with_modifier(mut self, modifier: ModifierDefinition) -> CoreResult<Self> {
        self.insert_modifier(modifier)?;
        Ok(self)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn modifier_count(&self) -> usize {
        self.modifiers.len()
    }
}

impl CatalogReference for InMemoryCatalog {
    fn resolve_item(&self, catalog_item_id: &str) -> CoreResult<CatalogItem> {
        self.items
            .get(catalog_item_id)
            .cloned()
            .ok_or_else(|| CoreError::CatalogItemNotFound(catalog_item_id.to_string()))
    }

    fn resolve_modifier(&self, code: &ModifierCode) -> CoreResult<ModifierDefinition> {
        self.modifiers
            .get(code)
            .cloned()
            .ok_or_else(|| CoreError::ModifierNotFound(code.to_string()))
    }

    fn applicable_modifiers(&self, category: CategoryCode) -> Vec<ModifierDefinition> {
        let mut applicable: Vec<ModifierDefinition> = self
            .modifiers
            .values()
            .filter(|m| m.is_applicable_to(category))
            .cloned()
            .collect();
        applicable.sort_by(|a, b| a.code.cmp(&b.code));
        applicable
    }
}
