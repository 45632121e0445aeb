//! Event input files.
//!
//! The CLI and HTTP server take an event's recipes and ingredients as JSON:
//!
//! ```json
//! {
//!   "eventId": "potluck-2024-06",
//!   "recipes": [{ "id": "r1", "name": "Green Curry" }],
//!   "ingredients": [
//!     { "id": "i1", "recipeId": "r1", "name": "garlic",
//!       "quantity": "1 1/2", "unit": "clove", "category": "produce" }
//!   ],
//!   "pantry": ["salt"]
//! }
//! ```
//!
//! Quantities may be numbers or human fractions; they are parsed here so
//! the core pipeline only ever sees decimals.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use grocery_merge_core::quantity::parse_fraction;
use grocery_merge_core::{GroceryCategory, RecipeIngredient};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInput {
    pub event_id: String,
    pub recipes: Vec<RecipeRef>,
    pub ingredients: Vec<IngredientInput>,
    #[serde(default)]
    pub pantry: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecipeRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QuantityInput {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientInput {
    pub id: String,
    pub recipe_id: String,
    pub name: String,
    #[serde(default)]
    pub quantity: Option<QuantityInput>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default = "default_category")]
    pub category: GroceryCategory,
    #[serde(default)]
    pub raw_text: String,
    #[serde(default)]
    pub sort_order: i64,
}

fn default_category() -> GroceryCategory {
    GroceryCategory::Other
}

/// A validated event ready for the pipeline.
#[derive(Debug, Clone)]
pub struct Event {
    pub event_id: String,
    pub ingredients: Vec<RecipeIngredient>,
    pub recipe_names: HashMap<String, String>,
    pub pantry: Vec<String>,
}

impl EventInput {
    /// Resolve quantities and build the recipe-name map.
    ///
    /// Unparseable quantity text is an error; a quantity is never guessed.
    pub fn into_event(self) -> Result<Event> {
        if self.event_id.trim().is_empty() {
            bail!("eventId must not be empty");
        }

        let recipe_names: HashMap<String, String> = self
            .recipes
            .into_iter()
            .map(|r| (r.id, r.name))
            .collect();

        let ingredients = self
            .ingredients
            .into_iter()
            .map(|ing| -> Result<RecipeIngredient> {
                let quantity = match ing.quantity {
                    None => None,
                    Some(QuantityInput::Number(n)) => Some(n),
                    Some(QuantityInput::Text(t)) if t.trim().is_empty() => None,
                    Some(QuantityInput::Text(t)) => Some(parse_fraction(&t).with_context(|| {
                        format!("ingredient '{}': invalid quantity '{}'", ing.id, t)
                    })?),
                };
                Ok(RecipeIngredient {
                    id: ing.id,
                    recipe_id: ing.recipe_id,
                    name: ing.name,
                    quantity,
                    unit: ing.unit,
                    category: ing.category,
                    raw_text: ing.raw_text,
                    sort_order: ing.sort_order,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Event {
            event_id: self.event_id,
            ingredients,
            recipe_names,
            pantry: self.pantry,
        })
    }
}

/// Load and validate an event file.
pub fn load_event(path: &Path) -> Result<Event> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read event file: {}", path.display()))?;
    let input: EventInput = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse event file: {}", path.display()))?;
    input.into_event()
}

/// Load a pantry file: one ingredient name per line, `#` starts a comment.
pub fn load_pantry(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pantry file: {}", path.display()))?;
    Ok(parse_pantry(&content))
}

pub fn parse_pantry(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Event> {
        serde_json::from_str::<EventInput>(json)?.into_event()
    }

    #[test]
    fn test_fraction_and_number_quantities() {
        let event = parse(
            r#"{
                "eventId": "e1",
                "recipes": [{"id": "r1", "name": "Curry"}],
                "ingredients": [
                    {"id": "i1", "recipeId": "r1", "name": "garlic", "quantity": "1 1/2", "unit": "clove", "category": "produce"},
                    {"id": "i2", "recipeId": "r1", "name": "rice", "quantity": 2, "unit": "cup", "category": "pantry"},
                    {"id": "i3", "recipeId": "r1", "name": "salt"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(event.ingredients[0].quantity, Some(1.5));
        assert_eq!(event.ingredients[1].quantity, Some(2.0));
        assert_eq!(event.ingredients[2].quantity, None);
        assert_eq!(event.ingredients[2].category, GroceryCategory::Other);
        assert_eq!(event.recipe_names["r1"], "Curry");
        assert!(event.pantry.is_empty());
    }

    #[test]
    fn test_bad_quantity_text_rejected() {
        let err = parse(
            r#"{"eventId": "e1", "recipes": [], "ingredients": [
                {"id": "i1", "recipeId": "r1", "name": "salt", "quantity": "a pinch"}
            ]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("a pinch"));
    }

    #[test]
    fn test_blank_event_id_rejected() {
        assert!(parse(r#"{"eventId": " ", "recipes": [], "ingredients": []}"#).is_err());
    }

    #[test]
    fn test_parse_pantry_skips_comments_and_blanks() {
        let pantry = parse_pantry("salt\n\n# staples\nolive oil  # extra virgin\n  pepper \n");
        assert_eq!(pantry, vec!["salt", "olive oil", "pepper"]);
    }
}
