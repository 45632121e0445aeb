//! Category grouping for display and export.

use serde::Serialize;

use crate::category::{GroceryCategory, CATEGORY_ORDER};
use crate::models::GroceryLine;

/// All items of one category, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryGroup<T> {
    pub category: GroceryCategory,
    pub display_name: &'static str,
    pub items: Vec<T>,
}

/// Partition `items` into groups following [`CATEGORY_ORDER`].
///
/// Every input item lands in exactly one group, relative order within a
/// group is preserved, and categories with no items are omitted.
pub fn group_by_category<T>(items: Vec<T>) -> Vec<CategoryGroup<T>>
where
    T: GroceryLine,
{
    let mut buckets: Vec<Vec<T>> = CATEGORY_ORDER.iter().map(|_| Vec::new()).collect();
    for item in items {
        buckets[item.category().rank()].push(item);
    }

    CATEGORY_ORDER
        .iter()
        .zip(buckets)
        .filter(|(_, items)| !items.is_empty())
        .map(|(category, items)| CategoryGroup {
            category: *category,
            display_name: category.display_name(),
            items,
        })
        .collect()
}
