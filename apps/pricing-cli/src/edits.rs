//! # Cart Edit Script
//!
//! A JSON array of edits replayed against one cart, the way the order wizard
//! would apply them as the operator works.
//!
//! ```json
//! [
//!   { "op": "add_item", "line_id": "l1", "catalog_item_id": "coat-wool", "quantity": 1 },
//!   { "op": "set_modifiers", "line_id": "l1", "modifiers": ["SILK_FABRIC"] },
//!   { "op": "set_urgency", "urgency": "EXPRESS_48H" },
//!   { "op": "set_discount", "discount": { "kind": "EVERCARD" } }
//! ]
//! ```
//!
//! ## User Workflow
//! ```text
//! Edit
//!   │
//!   ▼
//! apply_edit(cart, catalog) ──► Err ──► EditRejection { code, message }
//!   │                                   cart unchanged, replay continues
//!   ▼ Ok
//! cart snapshot ──► scheduler
//! ```

use std::fs;
use std::path::Path;

use aksi_core::{
    Cart, CatalogReference, CoreError, CoreResult, DiscountSelection, LineItem, ModifierCode,
    UrgencyLevel,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One cart edit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CartEdit {
    /// Adds a line. Without `line_id` a UUID is assigned.
    AddItem {
        #[serde(default)]
        line_id: Option<String>,
        catalog_item_id: String,
        quantity: i64,
        #[serde(default)]
        modifiers: Vec<ModifierCode>,
    },
    SetQuantity {
        line_id: String,
        quantity: i64,
    },
    /// Replaces the line's modifier selection, in the given order.
    SetModifiers {
        line_id: String,
        modifiers: Vec<ModifierCode>,
    },
    RemoveItem {
        line_id: String,
    },
    SetUrgency {
        urgency: UrgencyLevel,
    },
    SetDiscount {
        discount: DiscountSelection,
    },
    Clear,
}

impl CartEdit {
    /// Short name for log lines and rejection events.
    pub fn op(&self) -> &'static str {
        match self {
            CartEdit::AddItem { .. } => "add_item",
            CartEdit::SetQuantity { .. } => "set_quantity",
            CartEdit::SetModifiers { .. } => "set_modifiers",
            CartEdit::RemoveItem { .. } => "remove_item",
            CartEdit::SetUrgency { .. } => "set_urgency",
            CartEdit::SetDiscount { .. } => "set_discount",
            CartEdit::Clear => "clear",
        }
    }
}

/// Applies one edit. On error the cart is left unchanged.
pub fn apply_edit(cart: &mut Cart, catalog: &dyn CatalogReference, edit: &CartEdit) -> CoreResult<()> {
    match edit {
        CartEdit::AddItem {
            line_id,
            catalog_item_id,
            quantity,
            modifiers,
        } => {
            let item = match line_id {
                Some(id) => {
                    LineItem::resolve(catalog, id.as_str(), catalog_item_id, *quantity, modifiers)?
                }
                None => LineItem::create(catalog, catalog_item_id, *quantity, modifiers)?,
            };
            cart.add_item(item)
        }
        CartEdit::SetQuantity { line_id, quantity } => {
            let item = existing_item(cart, line_id)?.with_quantity(*quantity)?;
            cart.replace_item(item)
        }
        CartEdit::SetModifiers { line_id, modifiers } => {
            let item = existing_item(cart, line_id)?.with_modifiers(catalog, modifiers)?;
            cart.replace_item(item)
        }
        CartEdit::RemoveItem { line_id } => cart.remove_item(line_id).map(|_| ()),
        CartEdit::SetUrgency { urgency } => {
            let mut global = *cart.global_modifiers();
            global.urgency = *urgency;
            cart.set_global_modifiers(global);
            Ok(())
        }
        CartEdit::SetDiscount { discount } => {
            let mut global = *cart.global_modifiers();
            global.discount = *discount;
            cart.set_global_modifiers(global);
            Ok(())
        }
        CartEdit::Clear => {
            cart.clear();
            Ok(())
        }
    }
}

fn existing_item<'a>(cart: &'a Cart, line_id: &str) -> CoreResult<&'a LineItem> {
    cart.item(line_id)
        .ok_or_else(|| CoreError::LineItemNotFound(line_id.to_string()))
}

/// Parses an edit script from JSON text.
pub fn parse_edits(content: &str) -> Result<Vec<CartEdit>> {
    serde_json::from_str(content).context("Invalid edit script")
}

/// Reads and parses an edit script file.
pub fn load_edits(path: &Path) -> Result<Vec<CartEdit>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read edit script {}", path.display()))?;
    let edits = parse_edits(&content)?;
    tracing::info!(path = %path.display(), edits = edits.len(), "Edit script loaded");
    Ok(edits)
}

// =============================================================================
// Rejections
// =============================================================================

/// Machine-readable reason an edit was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionCode {
    /// Unknown catalog item, modifier or line.
    NotFound,

    /// Input validation failed.
    ValidationError,

    /// Modifier not permitted for the item's category.
    BusinessLogic,

    /// Cart operation failed (e.g. cart full).
    CartError,
}

/// An edit the cart refused.
///
/// ```json
/// { "index": 3, "op": "set_quantity", "code": "VALIDATION_ERROR", "message": "quantity must be positive" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditRejection {
    pub index: usize,
    pub op: &'static str,
    pub code: RejectionCode,
    pub message: String,
}

impl EditRejection {
    pub fn new(index: usize, edit: &CartEdit, err: &CoreError) -> Self {
        EditRejection {
            index,
            op: edit.op(),
            code: RejectionCode::from(err),
            message: err.to_string(),
        }
    }
}

impl From<&CoreError> for RejectionCode {
    fn from(err: &CoreError) -> Self {
        match err {
            CoreError::CatalogItemNotFound(_)
            | CoreError::ModifierNotFound(_)
            | CoreError::LineItemNotFound(_) => RejectionCode::NotFound,
            CoreError::ModifierNotApplicable { .. } => RejectionCode::BusinessLogic,
            CoreError::CartTooLarge { .. } => RejectionCode::CartError,
            CoreError::Validation(_) => RejectionCode::ValidationError,
        }
    }
}

// =============================================================================
// Replay
// =============================================================================

/// Applies every edit in order and returns the cart snapshot after each
/// accepted edit, plus the rejections.
pub fn replay(
    cart_id: &str,
    catalog: &dyn CatalogReference,
    edits: &[CartEdit],
) -> (Vec<Cart>, Vec<EditRejection>) {
    let mut cart = Cart::with_id(cart_id);
    let mut snapshots = Vec::with_capacity(edits.len());
    let mut rejections = Vec::new();

    for (index, edit) in edits.iter().enumerate() {
        match apply_edit(&mut cart, catalog, edit) {
            Ok(()) => snapshots.push(cart.clone()),
            Err(err) => {
                tracing::debug!(index, op = edit.op(), error = %err, "Edit rejected");
                rejections.push(EditRejection::new(index, edit, &err));
            }
        }
    }

    (snapshots, rejections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aksi_core::{
        CatalogItem, CategoryCode, InMemoryCatalog, ModifierDefinition, Money, Rate,
    };

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::new()
            .with_item(CatalogItem {
                id: "coat".to_string(),
                name: "Wool coat".to_string(),
                unit_price: Money::from_minor(10000),
                category: CategoryCode::ClothingCleaning,
            })
            .unwrap()
            .with_item(CatalogItem {
                id: "shirt".to_string(),
                name: "Shirt".to_string(),
                unit_price: Money::from_minor(5000),
                category: CategoryCode::Laundry,
            })
            .unwrap()
            .with_modifier(
                ModifierDefinition::percentage(
                    ModifierCode::parse("SILK_FABRIC").unwrap(),
                    "Silk fabric",
                    Rate::from_percent(20),
                )
                .only_for([CategoryCode::ClothingCleaning]),
            )
            .unwrap()
    }

    #[test]
    fn test_parse_edit_script() {
        let edits = parse_edits(
            r#"[
                { "op": "add_item", "line_id": "l1", "catalog_item_id": "coat", "quantity": 2,
                  "modifiers": ["silk_fabric"] },
                { "op": "set_urgency", "urgency": "EXPRESS_48H" },
                { "op": "set_discount", "discount": { "kind": "CUSTOM", "percentage": 50 } },
                { "op": "clear" }
            ]"#,
        )
        .unwrap();

        assert_eq!(edits.len(), 4);
        assert_eq!(
            edits[0],
            CartEdit::AddItem {
                line_id: Some("l1".to_string()),
                catalog_item_id: "coat".to_string(),
                quantity: 2,
                modifiers: vec![ModifierCode::parse("SILK_FABRIC").unwrap()],
            }
        );
        assert_eq!(
            edits[1],
            CartEdit::SetUrgency {
                urgency: UrgencyLevel::Express48h
            }
        );
        assert_eq!(
            edits[2],
            CartEdit::SetDiscount {
                discount: DiscountSelection::custom(50).unwrap()
            }
        );
        assert_eq!(edits[3], CartEdit::Clear);
    }

    #[test]
    fn test_out_of_range_custom_discount_fails_to_parse() {
        let result = parse_edits(
            r#"[{ "op": "set_discount", "discount": { "kind": "CUSTOM", "percentage": 150 } }]"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_extreme_scheme_percentage_fails_to_parse() {
        let result = parse_edits(
            r#"[{ "op": "set_discount", "discount": { "kind": "NONE", "percentage": 9223372036854775807 } }]"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_edits_build_the_cart() {
        let catalog = catalog();
        let mut cart = Cart::with_id("order-1");

        let edits = [
            CartEdit::AddItem {
                line_id: Some("l1".to_string()),
                catalog_item_id: "coat".to_string(),
                quantity: 1,
                modifiers: vec![],
            },
            CartEdit::SetQuantity {
                line_id: "l1".to_string(),
                quantity: 2,
            },
            CartEdit::SetModifiers {
                line_id: "l1".to_string(),
                modifiers: vec![ModifierCode::parse("SILK_FABRIC").unwrap()],
            },
            CartEdit::SetUrgency {
                urgency: UrgencyLevel::Express48h,
            },
        ];
        for edit in &edits {
            apply_edit(&mut cart, &catalog, edit).unwrap();
        }

        let line = cart.item("l1").unwrap();
        assert_eq!(line.quantity(), 2);
        assert_eq!(line.applied_modifiers().len(), 1);
        assert_eq!(cart.global_modifiers().urgency, UrgencyLevel::Express48h);
        assert_eq!(aksi_core::compute_breakdown(&cart).total.minor(), 36000);
    }

    #[test]
    fn test_add_item_without_line_id_assigns_one() {
        let catalog = catalog();
        let mut cart = Cart::with_id("order-1");
        let edit = CartEdit::AddItem {
            line_id: None,
            catalog_item_id: "shirt".to_string(),
            quantity: 1,
            modifiers: vec![],
        };

        apply_edit(&mut cart, &catalog, &edit).unwrap();
        apply_edit(&mut cart, &catalog, &edit).unwrap();

        assert_eq!(cart.item_count(), 2);
        assert_ne!(cart.items()[0].id(), cart.items()[1].id());
    }

    #[test]
    fn test_rejected_edit_leaves_cart_unchanged() {
        let catalog = catalog();
        let mut cart = Cart::with_id("order-1");
        apply_edit(
            &mut cart,
            &catalog,
            &CartEdit::AddItem {
                line_id: Some("l1".to_string()),
                catalog_item_id: "shirt".to_string(),
                quantity: 1,
                modifiers: vec![],
            },
        )
        .unwrap();
        let before = cart.clone();

        let err = apply_edit(
            &mut cart,
            &catalog,
            &CartEdit::SetModifiers {
                line_id: "l1".to_string(),
                modifiers: vec![ModifierCode::parse("SILK_FABRIC").unwrap()],
            },
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::ModifierNotApplicable { .. }));

        let err = apply_edit(
            &mut cart,
            &catalog,
            &CartEdit::SetQuantity {
                line_id: "l1".to_string(),
                quantity: 0,
            },
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        assert_eq!(cart, before);
    }

    #[test]
    fn test_replay_collects_snapshots_and_rejections() {
        let catalog = catalog();
        let edits = vec![
            CartEdit::AddItem {
                line_id: Some("l1".to_string()),
                catalog_item_id: "coat".to_string(),
                quantity: 1,
                modifiers: vec![],
            },
            CartEdit::RemoveItem {
                line_id: "missing".to_string(),
            },
            CartEdit::AddItem {
                line_id: Some("l2".to_string()),
                catalog_item_id: "unknown".to_string(),
                quantity: 1,
                modifiers: vec![],
            },
            CartEdit::SetQuantity {
                line_id: "l1".to_string(),
                quantity: 3,
            },
        ];

        let (snapshots, rejections) = replay("order-1", &catalog, &edits);

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[1].total_quantity(), 3);
        assert_eq!(rejections.len(), 2);
        assert_eq!(rejections[0].index, 1);
        assert_eq!(rejections[0].op, "remove_item");
        assert_eq!(rejections[0].code, RejectionCode::NotFound);
        assert_eq!(rejections[1].index, 2);
        assert_eq!(rejections[1].message, "Catalog item not found: unknown");
    }

    #[test]
    fn test_demo_script_replays() {
        let catalog =
            crate::catalog_file::parse_catalog(include_str!("../demo/catalog.toml")).unwrap();
        let edits = parse_edits(include_str!("../demo/edits.json")).unwrap();

        let (snapshots, rejections) = replay("demo", &catalog, &edits);

        let codes: Vec<_> = rejections.iter().map(|r| (r.index, r.code)).collect();
        assert_eq!(
            codes,
            vec![
                (3, RejectionCode::BusinessLogic),
                (6, RejectionCode::ValidationError),
                (11, RejectionCode::NotFound),
            ]
        );
        assert_eq!(snapshots.len(), 9);

        // coat 67500 + shirts 30000 (laundry) + dress 272500, +50%, -10% of 340000
        let breakdown = aksi_core::compute_breakdown(snapshots.last().unwrap());
        assert_eq!(breakdown.items_subtotal.minor(), 370000);
        assert_eq!(breakdown.urgency_amount.minor(), 185000);
        assert_eq!(breakdown.discount_amount.minor(), 34000);
        assert_eq!(breakdown.total.minor(), 521000);
    }

    #[test]
    fn test_rejection_serialization() {
        let rejection = EditRejection::new(
            0,
            &CartEdit::Clear,
            &CoreError::CartTooLarge { max: 100 },
        );
        let json = serde_json::to_value(&rejection).unwrap();
        assert_eq!(json["code"], "CART_ERROR");
        assert_eq!(json["op"], "clear");
    }
}
