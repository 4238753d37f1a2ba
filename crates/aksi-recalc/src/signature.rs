//! # Input Signature
//!
//! A digest of exactly the cart fields the calculation reads. Two carts with
//! the same signature price identically; the scheduler relies on this to skip
//! redundant work.
//!
//! ## Projection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart                                  Signature input                  │
//! │  ────                                  ───────────────                  │
//! │  id ───────────────────────────────►   (excluded)                       │
//! │  items[i].id ──────────────────────►   items[i].id                      │
//! │  items[i].catalog_item_id ─────────►   items[i].catalogItemId           │
//! │  items[i].quantity ────────────────►   items[i].quantity                │
//! │  items[i].unit_price ──────────────►   items[i].unitPrice               │
//! │  items[i].category ────────────────►   items[i].category                │
//! │  items[i].applied_modifiers ───────►   items[i].modifiers (code, kind)  │
//! │  global_modifiers ─────────────────►   urgency, discount                │
//! │                                                                         │
//! │  canonical JSON ──► SHA-256 ──► lowercase hex                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Item order is part of the signature because breakdown lines follow it.

use std::fmt;

use aksi_core::{AppliedModifier, Cart, CategoryCode, DiscountSelection, Money, UrgencyLevel};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::RecalcResult;

/// Hex-encoded SHA-256 of a cart's priced fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct InputSignature(String);

impl InputSignature {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for InputSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignatureInput<'a> {
    items: Vec<ItemInput<'a>>,
    urgency: UrgencyLevel,
    discount: DiscountSelection,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemInput<'a> {
    id: &'a str,
    catalog_item_id: &'a str,
    quantity: i64,
    unit_price: Money,
    category: CategoryCode,
    modifiers: &'a [AppliedModifier],
}

/// Derives the input signature of a cart.
pub fn derive_signature(cart: &Cart) -> RecalcResult<InputSignature> {
    let global = cart.global_modifiers();
    let input = SignatureInput {
        items: cart
            .items()
            .iter()
            .map(|item| ItemInput {
                id: item.id(),
                catalog_item_id: item.catalog_item_id(),
                quantity: item.quantity(),
                unit_price: item.unit_price(),
                category: item.category(),
                modifiers: item.applied_modifiers(),
            })
            .collect(),
        urgency: global.urgency,
        discount: global.discount,
    };

    let canonical = serde_json::to_vec(&input)?;

    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    let digest = hasher.finalize();

    Ok(InputSignature(hex::encode(digest)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aksi_core::{
        CatalogItem, DiscountScheme, GlobalModifiers, InMemoryCatalog, LineItem, ModifierCode,
        ModifierDefinition, Rate,
    };

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::new()
            .with_item(CatalogItem {
                id: "coat".to_string(),
                name: "Wool coat".to_string(),
                unit_price: Money::from_minor(45000),
                category: CategoryCode::ClothingCleaning,
            })
            .unwrap()
            .with_modifier(ModifierDefinition::percentage(
                ModifierCode::parse("HEAVY_SOILING").unwrap(),
                "Heavy soiling",
                Rate::from_percent(20),
            ))
            .unwrap()
    }

    fn cart(cart_id: &str, qty: i64) -> Cart {
        let item = LineItem::resolve(&catalog(), "l1", "coat", qty, &[]).unwrap();
        Cart::from_parts(cart_id, [item], GlobalModifiers::default()).unwrap()
    }

    #[test]
    fn test_signature_is_stable_hex() {
        let sig = derive_signature(&cart("a", 1)).unwrap();
        assert_eq!(sig.as_str().len(), 64);
        assert!(sig.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(sig, derive_signature(&cart("a", 1)).unwrap());
        assert_eq!(sig.short().len(), 12);
    }

    #[test]
    fn test_signature_is_lowercase_hex_of_digest() {
        let sig = derive_signature(&cart("a", 1)).unwrap();
        assert!(!sig.as_str().chars().any(|c| c.is_ascii_uppercase()));

        let bytes = hex::decode(sig.as_str()).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(hex::encode(bytes), sig.as_str());
    }

    #[test]
    fn test_cart_id_is_excluded() {
        assert_eq!(
            derive_signature(&cart("order-1", 2)).unwrap(),
            derive_signature(&cart("order-2", 2)).unwrap()
        );
    }

    #[test]
    fn test_priced_fields_change_signature() {
        let base = cart("a", 1);
        let base_sig = derive_signature(&base).unwrap();

        assert_ne!(base_sig, derive_signature(&cart("a", 2)).unwrap());

        let mut discounted = base.clone();
        discounted.set_global_modifiers(GlobalModifiers {
            urgency: UrgencyLevel::Normal,
            discount: DiscountSelection::scheme(DiscountScheme::Evercard),
        });
        assert_ne!(base_sig, derive_signature(&discounted).unwrap());

        let mut modified = base.clone();
        let edited = modified
            .item("l1")
            .unwrap()
            .with_modifiers(&catalog(), &[ModifierCode::parse("HEAVY_SOILING").unwrap()])
            .unwrap();
        modified.replace_item(edited).unwrap();
        assert_ne!(base_sig, derive_signature(&modified).unwrap());
    }
}
