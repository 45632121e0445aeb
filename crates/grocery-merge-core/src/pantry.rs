//! Pantry exclusion filter.
//!
//! Removes shopping-list items the user already owns. Matching is exact on
//! the trimmed, case-folded name: `"garlic"` in the pantry removes
//! `"Garlic"` but never `"garlic powder"`.

use std::collections::HashSet;

use crate::models::{normalize_key, GroceryLine};

/// Items surviving the pantry filter plus how many were dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct PantryFiltered<T> {
    pub items: Vec<T>,
    pub removed: usize,
}

/// Drop every item whose name matches a pantry entry.
///
/// Surviving items are returned unchanged and in their original order.
/// Blank pantry entries are ignored.
pub fn filter_pantry<T, S>(items: Vec<T>, pantry_names: &[S]) -> PantryFiltered<T>
where
    T: GroceryLine,
    S: AsRef<str>,
{
    let pantry: HashSet<String> = pantry_names
        .iter()
        .map(|n| normalize_key(n.as_ref()))
        .filter(|n| !n.is_empty())
        .collect();

    if pantry.is_empty() {
        return PantryFiltered { items, removed: 0 };
    }

    let before = items.len();
    let items: Vec<T> = items
        .into_iter()
        .filter(|item| !pantry.contains(&normalize_key(item.name())))
        .collect();
    let removed = before - items.len();

    if removed > 0 {
        tracing::debug!(removed, "pantry items excluded");
    }

    PantryFiltered { items, removed }
}
