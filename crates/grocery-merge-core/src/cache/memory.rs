//! In-memory [`GroceryCache`] implementation for tests and embedding.
//!
//! Uses a `HashMap` behind `std::sync::RwLock`. Snapshots live only as
//! long as the value.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;

use crate::models::{GroceryCacheEntry, SmartGroceryItem};

use super::{canonical_recipe_ids, GroceryCache};

/// In-memory grocery cache.
pub struct InMemoryGroceryCache {
    entries: RwLock<HashMap<String, GroceryCacheEntry>>,
}

impl InMemoryGroceryCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryGroceryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GroceryCache for InMemoryGroceryCache {
    async fn load(&self, event_id: &str) -> Result<Option<GroceryCacheEntry>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow!("grocery cache lock poisoned"))?;
        Ok(entries.get(event_id).cloned())
    }

    async fn save(
        &self,
        event_id: &str,
        items: &[SmartGroceryItem],
        recipe_ids: &[String],
    ) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("grocery cache lock poisoned"))?;
        entries.insert(
            event_id.to_string(),
            GroceryCacheEntry {
                event_id: event_id.to_string(),
                items: items.to_vec(),
                recipe_ids: canonical_recipe_ids(recipe_ids),
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete(&self, event_id: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("grocery cache lock poisoned"))?;
        entries.remove(event_id);
        Ok(())
    }
}
