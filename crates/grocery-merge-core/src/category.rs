//! Grocery category taxonomy.
//!
//! A closed set of store aisles used for grouping and ordering. Both the
//! [`group`](crate::group) module and every display/export path read the
//! order and labels from here so they can never disagree.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Grocery-store aisle an ingredient belongs to.
///
/// Serialized with the snake_case wire names used by the merge service
/// and the cache (`"meat_seafood"`, `"spices"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroceryCategory {
    Produce,
    MeatSeafood,
    Dairy,
    Pantry,
    Spices,
    Frozen,
    Bakery,
    Beverages,
    Condiments,
    Other,
}

/// Display precedence for grouped shopping lists.
pub const CATEGORY_ORDER: [GroceryCategory; 10] = [
    GroceryCategory::Produce,
    GroceryCategory::MeatSeafood,
    GroceryCategory::Dairy,
    GroceryCategory::Bakery,
    GroceryCategory::Pantry,
    GroceryCategory::Spices,
    GroceryCategory::Condiments,
    GroceryCategory::Frozen,
    GroceryCategory::Beverages,
    GroceryCategory::Other,
];

/// Returned when a wire string is not one of the known category names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown grocery category: '{0}'")]
pub struct CategoryParseError(pub String);

impl GroceryCategory {
    /// Human label shown as a section heading.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Produce => "Produce",
            Self::MeatSeafood => "Protein",
            Self::Dairy => "Dairy",
            Self::Pantry => "Pantry",
            Self::Spices => "Spices",
            Self::Frozen => "Frozen",
            Self::Bakery => "Bakery",
            Self::Beverages => "Beverages",
            Self::Condiments => "Condiments",
            Self::Other => "Other",
        }
    }

    /// Wire name, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Produce => "produce",
            Self::MeatSeafood => "meat_seafood",
            Self::Dairy => "dairy",
            Self::Pantry => "pantry",
            Self::Spices => "spices",
            Self::Frozen => "frozen",
            Self::Bakery => "bakery",
            Self::Beverages => "beverages",
            Self::Condiments => "condiments",
            Self::Other => "other",
        }
    }

    /// Position of this category within [`CATEGORY_ORDER`].
    pub fn rank(self) -> usize {
        CATEGORY_ORDER
            .iter()
            .position(|c| *c == self)
            .unwrap_or(CATEGORY_ORDER.len())
    }
}

impl fmt::Display for GroceryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroceryCategory {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CATEGORY_ORDER
            .iter()
            .copied()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| CategoryParseError(s.to_string()))
    }
}
