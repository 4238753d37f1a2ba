//! # Price List File
//!
//! Loads a price list from TOML into an [`InMemoryCatalog`].
//!
//! ## File Layout
//! ```toml
//! [[items]]
//! id = "coat-wool"
//! name = "Wool coat"
//! unit_price = 45000          # minor units
//! category = "CLOTHING_CLEANING"
//!
//! [[modifiers]]
//! code = "SILK_FABRIC"
//! name = "Silk fabric"
//! type = "PERCENTAGE"         # value in basis points
//! value = 5000
//! categories = ["CLOTHING_CLEANING"]   # omitted or empty = all categories
//! ```

use std::fs;
use std::path::Path;

use aksi_core::{
    CatalogItem, CategoryCode, InMemoryCatalog, ModifierCode, ModifierDefinition, Money, Rate,
};
use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    items: Vec<ItemEntry>,
    #[serde(default)]
    modifiers: Vec<ModifierEntry>,
}

#[derive(Debug, Deserialize)]
struct ItemEntry {
    id: String,
    name: String,
    unit_price: i64,
    category: CategoryCode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum ModifierType {
    Percentage,
    Fixed,
}

#[derive(Debug, Deserialize)]
struct ModifierEntry {
    code: ModifierCode,
    name: String,
    #[serde(rename = "type")]
    kind: ModifierType,
    value: i64,
    #[serde(default)]
    categories: Vec<CategoryCode>,
}

impl From<ModifierEntry> for ModifierDefinition {
    fn from(entry: ModifierEntry) -> Self {
        let definition = match entry.kind {
            ModifierType::Percentage => {
                ModifierDefinition::percentage(entry.code, entry.name, Rate::from_bps(entry.value))
            }
            ModifierType::Fixed => {
                ModifierDefinition::fixed(entry.code, entry.name, Money::from_minor(entry.value))
            }
        };

        if entry.categories.is_empty() {
            definition
        } else {
            definition.only_for(entry.categories)
        }
    }
}

/// Parses a price list from TOML text.
pub fn parse_catalog(content: &str) -> Result<InMemoryCatalog> {
    let file: CatalogFile = toml::from_str(content).context("Invalid price list")?;

    let mut catalog = InMemoryCatalog::new();
    for entry in file.items {
        let id = entry.id.clone();
        catalog
            .insert_item(CatalogItem {
                id: entry.id,
                name: entry.name,
                unit_price: Money::from_minor(entry.unit_price),
                category: entry.category,
            })
            .with_context(|| format!("Invalid price list item '{}'", id))?;
    }
    for entry in file.modifiers {
        let code = entry.code.clone();
        catalog
            .insert_modifier(entry.into())
            .with_context(|| format!("Invalid price list modifier '{}'", code))?;
    }

    Ok(catalog)
}

/// Reads and parses a price list file.
pub fn load_catalog(path: &Path) -> Result<InMemoryCatalog> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read price list {}", path.display()))?;
    let catalog = parse_catalog(&content)?;

    tracing::info!(
        path = %path.display(),
        items = catalog.item_count(),
        modifiers = catalog.modifier_count(),
        "Price list loaded"
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aksi_core::{CatalogReference, ModifierKind};

    const PRICE_LIST: &str = r#"
        [[items]]
        id = "coat-wool"
        name = "Wool coat"
        unit_price = 45000
        category = "CLOTHING_CLEANING"

        [[items]]
        id = "shirt"
        name = "Shirt"
        unit_price = 6000
        category = "LAUNDRY"

        [[modifiers]]
        code = "silk_fabric"
        name = "Silk fabric"
        type = "PERCENTAGE"
        value = 5000
        categories = ["CLOTHING_CLEANING"]

        [[modifiers]]
        code = "BUTTON_SEWING"
        name = "Button sewing"
        type = "FIXED"
        value = 2500
    "#;

    #[test]
    fn test_parse_items_and_modifiers() {
        let catalog = parse_catalog(PRICE_LIST).unwrap();
        assert_eq!(catalog.item_count(), 2);
        assert_eq!(catalog.modifier_count(), 2);

        let shirt = catalog.resolve_item("shirt").unwrap();
        assert_eq!(shirt.unit_price.minor(), 6000);
        assert_eq!(shirt.category, CategoryCode::Laundry);

        let silk = catalog
            .resolve_modifier(&ModifierCode::parse("SILK_FABRIC").unwrap())
            .unwrap();
        assert_eq!(silk.kind, ModifierKind::Percentage(Rate::from_percent(50)));
        assert!(silk.is_applicable_to(CategoryCode::ClothingCleaning));
        assert!(!silk.is_applicable_to(CategoryCode::Laundry));

        let buttons = catalog
            .resolve_modifier(&ModifierCode::parse("BUTTON_SEWING").unwrap())
            .unwrap();
        assert_eq!(buttons.kind, ModifierKind::Fixed(Money::from_minor(2500)));
        assert!(buttons.is_applicable_to(CategoryCode::Laundry));
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let content = r#"
            [[items]]
            id = "boots"
            name = "Boots"
            unit_price = 1000
            category = "SHOES"
        "#;
        assert!(parse_catalog(content).is_err());
    }

    #[test]
    fn test_negative_price_is_rejected() {
        let content = r#"
            [[items]]
            id = "coat"
            name = "Coat"
            unit_price = -1
            category = "FUR"
        "#;
        let err = parse_catalog(content).unwrap_err();
        assert!(err.to_string().contains("coat"));
    }

    #[test]
    fn test_out_of_range_modifier_is_rejected() {
        let content = r#"
            [[modifiers]]
            code = "GOLD_THREAD"
            name = "Gold thread"
            type = "PERCENTAGE"
            value = 4611686018427387903
        "#;
        let err = parse_catalog(content).unwrap_err();
        assert!(err.to_string().contains("GOLD_THREAD"));
    }

    #[test]
    fn test_empty_file_is_an_empty_catalog() {
        let catalog = parse_catalog("").unwrap();
        assert_eq!(catalog.item_count(), 0);
        assert_eq!(catalog.modifier_count(), 0);
    }
}
