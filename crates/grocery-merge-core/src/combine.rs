//! Deterministic local combination of recipe ingredients.
//!
//! Groups ingredient lines whose normalized name and unit are equal and sums
//! their quantities. No synonym or cross-unit judgment is made here; that is
//! the semantic merge's job. The output is a pure function of the input
//! order and the recipe-name map.
//!
//! # Algorithm
//!
//! 1. Key each line by `(trim+lowercase name, trim+lowercase unit)`. An
//!    absent (or blank) unit is its own key.
//! 2. The first line seen for a key fixes the group's display name, unit
//!    spelling, and category.
//! 3. Quantities sum while every member has one; a single absent quantity
//!    makes the group total absent.
//! 4. Recipe display names accumulate per group, deduplicated, first-seen.
//! 5. Groups are emitted in first-seen order.

use std::collections::HashMap;

use thiserror::Error;

use crate::models::{normalize_key, CombinedGroceryItem, RecipeIngredient};

/// Caller contract violations detected while combining.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombineError {
    /// An ingredient references a recipe that has no display name.
    #[error("no recipe name for recipe '{recipe_id}' (ingredient '{ingredient_id}')")]
    MissingRecipeName {
        recipe_id: String,
        ingredient_id: String,
    },
}

type GroupKey = (String, Option<String>);

struct Group {
    item: CombinedGroceryItem,
    quantity_complete: bool,
}

/// Combine raw ingredient lines into shopping-list items.
///
/// `recipe_names` maps every `recipe_id` referenced by `ingredients` to the
/// recipe's display name. A missing entry is an error, never a placeholder,
/// because a wrong source attribution silently corrupts the list.
pub fn combine(
    ingredients: &[RecipeIngredient],
    recipe_names: &HashMap<String, String>,
) -> Result<Vec<CombinedGroceryItem>, CombineError> {
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();

    for ing in ingredients {
        let recipe_name = recipe_names.get(&ing.recipe_id).ok_or_else(|| {
            CombineError::MissingRecipeName {
                recipe_id: ing.recipe_id.clone(),
                ingredient_id: ing.id.clone(),
            }
        })?;

        let unit = clean_unit(ing.unit.as_deref());
        let key = (normalize_key(&ing.name), unit.as_deref().map(normalize_key));

        match index.get(&key) {
            Some(&i) => {
                let group = &mut groups[i];
                match (group.item.total_quantity, ing.quantity) {
                    (Some(total), Some(q)) if group.quantity_complete => {
                        group.item.total_quantity = Some(total + q);
                    }
                    _ => {
                        group.quantity_complete = false;
                        group.item.total_quantity = None;
                    }
                }
                if !group.item.source_recipes.contains(recipe_name) {
                    group.item.source_recipes.push(recipe_name.clone());
                }
            }
            None => {
                index.insert(key, groups.len());
                groups.push(Group {
                    item: CombinedGroceryItem {
                        name: ing.name.trim().to_string(),
                        total_quantity: ing.quantity,
                        unit,
                        category: ing.category,
                        source_recipes: vec![recipe_name.clone()],
                    },
                    quantity_complete: ing.quantity.is_some(),
                });
            }
        }
    }

    tracing::debug!(
        ingredients = ingredients.len(),
        items = groups.len(),
        "naive combine finished"
    );

    Ok(groups.into_iter().map(|g| g.item).collect())
}

/// Sorted, deduplicated ids of the recipes contributing to `ingredients`.
///
/// This is the key a cached merge result is validated against.
pub fn contributing_recipe_ids(ingredients: &[RecipeIngredient]) -> Vec<String> {
    let mut ids: Vec<String> = ingredients.iter().map(|i| i.recipe_id.clone()).collect();
    ids.sort();
    ids.dedup();
    ids
}

fn clean_unit(unit: Option<&str>) -> Option<String> {
    unit.map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
}
