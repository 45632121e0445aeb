//! Core data models for the grocery aggregation pipeline.
//!
//! [`RecipeIngredient`]s come in from the extraction pipeline, the naive
//! combiner turns them into [`CombinedGroceryItem`]s, and the semantic merge
//! produces [`SmartGroceryItem`]s. The two output shapes stay distinct types:
//! a naive total is *absent* when some source line had no quantity, while a
//! merged total is *null* when the merge service could not settle on one.
//! They are displayed differently ("to taste" vs a dash).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::GroceryCategory;

/// One ingredient line belonging to one recipe.
///
/// Produced by the upstream extractor with `name` already lower-cased and
/// singularized. Consumed read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredient {
    pub id: String,
    pub recipe_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub category: GroceryCategory,
    #[serde(default)]
    pub raw_text: String,
    #[serde(default)]
    pub sort_order: i64,
}

/// Output of the naive combiner.
///
/// `total_quantity` is absent when any contributing line lacked a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedGroceryItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub category: GroceryCategory,
    pub source_recipes: Vec<String>,
}

/// Output of the semantic merge.
///
/// `total_quantity` is always present on the wire, as a number or `null`.
/// Merge responses may spell the field `quantity`; both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartGroceryItem {
    pub name: String,
    #[serde(alias = "quantity")]
    pub total_quantity: Option<f64>,
    pub unit: Option<String>,
    pub category: GroceryCategory,
    pub source_recipes: Vec<String>,
}

/// The cached merge result for one event.
///
/// `recipe_ids` is kept sorted; the entry is valid for a request only when
/// the request's sorted recipe-id set is exactly equal to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroceryCacheEntry {
    pub event_id: String,
    pub items: Vec<SmartGroceryItem>,
    pub recipe_ids: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

/// Read access shared by both item shapes, so the pantry filter and the
/// category grouper can work on either.
pub trait GroceryLine {
    fn name(&self) -> &str;
    fn category(&self) -> GroceryCategory;
    fn unit(&self) -> Option<&str>;
    fn source_recipes(&self) -> &[String];
    /// Quantity rendered for people, using the shape's own empty marker.
    fn display_quantity(&self) -> String;
}

impl GroceryLine for CombinedGroceryItem {
    fn name(&self) -> &str {
        &self.name
    }
    fn category(&self) -> GroceryCategory {
        self.category
    }
    fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }
    fn source_recipes(&self) -> &[String] {
        &self.source_recipes
    }
    fn display_quantity(&self) -> String {
        crate::quantity::display_naive_quantity(self.total_quantity)
    }
}

impl GroceryLine for SmartGroceryItem {
    fn name(&self) -> &str {
        &self.name
    }
    fn category(&self) -> GroceryCategory {
        self.category
    }
    fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }
    fn source_recipes(&self) -> &[String] {
        &self.source_recipes
    }
    fn display_quantity(&self) -> String {
        crate::quantity::display_merged_quantity(self.total_quantity)
    }
}

impl From<CombinedGroceryItem> for SmartGroceryItem {
    fn from(item: CombinedGroceryItem) -> Self {
        Self {
            name: item.name,
            total_quantity: item.total_quantity,
            unit: item.unit,
            category: item.category,
            source_recipes: item.source_recipes,
        }
    }
}

/// Case-fold and trim a name or unit for comparison.
pub fn normalize_key(text: &str) -> String {
    text.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smart_item_serializes_null_quantity() {
        let item = SmartGroceryItem {
            name: "salt".to_string(),
            total_quantity: None,
            unit: None,
            category: GroceryCategory::Spices,
            source_recipes: vec!["Soup".to_string()],
        };
        let json = serde_json::to_value(&item).unwrap();
        assert!(json["totalQuantity"].is_null());
        assert!(json.as_object().unwrap().contains_key("totalQuantity"));
        assert!(json["unit"].is_null());
    }

    #[test]
    fn test_combined_item_omits_absent_quantity() {
        let item = CombinedGroceryItem {
            name: "salt".to_string(),
            total_quantity: None,
            unit: None,
            category: GroceryCategory::Spices,
            source_recipes: vec![],
        };
        let json = serde_json::to_value(&item).unwrap();
        assert!(!json.as_object().unwrap().contains_key("totalQuantity"));
    }

    #[test]
    fn test_smart_item_accepts_quantity_alias() {
        let item: SmartGroceryItem = serde_json::from_str(
            r#"{"name":"onion","quantity":2,"unit":null,"category":"produce","sourceRecipes":["A"]}"#,
        )
        .unwrap();
        assert_eq!(item.total_quantity, Some(2.0));
    }

    #[test]
    fn test_display_quantity_per_shape() {
        let naive = CombinedGroceryItem {
            name: "pepper".to_string(),
            total_quantity: None,
            unit: None,
            category: GroceryCategory::Spices,
            source_recipes: vec![],
        };
        let smart = SmartGroceryItem::from(naive.clone());
        assert_eq!(naive.display_quantity(), "to taste");
        assert_eq!(smart.display_quantity(), "-");
    }

    #[test]
    fn test_ingredient_defaults() {
        let ing: RecipeIngredient = serde_json::from_str(
            r#"{"id":"i1","recipeId":"r1","name":"egg","category":"dairy"}"#,
        )
        .unwrap();
        assert_eq!(ing.quantity, None);
        assert_eq!(ing.unit, None);
        assert_eq!(ing.sort_order, 0);
        assert!(ing.raw_text.is_empty());
    }
}
