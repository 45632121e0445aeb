//! Per-event cache of semantic merge results.
//!
//! The [`GroceryCache`] trait abstracts the persistence backend so the
//! orchestrator can run against SQLite in the application and against
//! [`memory::InMemoryGroceryCache`] in tests.
//!
//! Each event holds at most one snapshot. A snapshot is only reused when
//! the sorted recipe-id set it was built from equals the current one; any
//! added, removed, or re-parsed recipe changes the set and the snapshot is
//! ignored (see [`is_fresh`]). [`GroceryCache::delete`] exists for callers
//! that want to drop a snapshot eagerly.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{GroceryCacheEntry, SmartGroceryItem};

/// Abstract storage backend for merged grocery lists.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`load`](GroceryCache::load) | Fetch the snapshot for an event |
/// | [`save`](GroceryCache::save) | Upsert the snapshot (last writer wins) |
/// | [`delete`](GroceryCache::delete) | Drop the snapshot |
///
/// Errors returned here are never fatal to the pipeline; the orchestrator
/// logs them and carries on as if the cache were empty.
#[async_trait]
pub trait GroceryCache: Send + Sync {
    /// Fetch the stored snapshot for `event_id`, if any.
    async fn load(&self, event_id: &str) -> Result<Option<GroceryCacheEntry>>;

    /// Store `items` for `event_id`, replacing any previous snapshot.
    ///
    /// `recipe_ids` is sorted and deduplicated before it is stored.
    async fn save(
        &self,
        event_id: &str,
        items: &[SmartGroceryItem],
        recipe_ids: &[String],
    ) -> Result<()>;

    /// Remove the snapshot for `event_id`. Missing entries are not an error.
    async fn delete(&self, event_id: &str) -> Result<()>;
}

/// Sort and deduplicate recipe ids into their stored form.
pub fn canonical_recipe_ids(recipe_ids: &[String]) -> Vec<String> {
    let mut ids = recipe_ids.to_vec();
    ids.sort();
    ids.dedup();
    ids
}

/// Whether `entry` was built from exactly the recipes in `recipe_ids`.
///
/// Order of `recipe_ids` does not matter.
pub fn is_fresh(entry: &GroceryCacheEntry, recipe_ids: &[String]) -> bool {
    canonical_recipe_ids(&entry.recipe_ids) == canonical_recipe_ids(recipe_ids)
}
