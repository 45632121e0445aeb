//! # Grocery Merge Core
//!
//! Shared, runtime-agnostic logic for Grocery Merge: ingredient models, the
//! category taxonomy, the fraction codec, naive combining, pantry
//! filtering, category grouping, the semantic-merge and cache ports, and
//! the orchestrator that ties them together.
//!
//! This crate contains no tokio, sqlx, HTTP client, or filesystem I/O.
//! Persistence and network access are supplied by implementing
//! [`cache::GroceryCache`] and [`merge::MergeService`].

pub mod cache;
pub mod category;
pub mod combine;
pub mod group;
pub mod merge;
pub mod models;
pub mod pantry;
pub mod quantity;
pub mod smart;

pub use category::{GroceryCategory, CATEGORY_ORDER};
pub use combine::{combine, CombineError};
pub use group::{group_by_category, CategoryGroup};
pub use merge::{MergeError, MergeOutcome, MergeService};
pub use models::{CombinedGroceryItem, GroceryLine, RecipeIngredient, SmartGroceryItem};
pub use pantry::{filter_pantry, PantryFiltered};
pub use smart::{FallbackReason, GroceryList, SmartCombiner};
