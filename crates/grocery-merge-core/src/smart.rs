//! End-to-end grocery pipeline.
//!
//! [`SmartCombiner`] composes the naive combiner, the grocery cache, and a
//! semantic merge service:
//!
//! ```text
//! combine ─▶ encode fractions ─▶ cache fresh? ──yes──▶ cached items
//!                                     │no
//!                                     ▼
//!                                merge service ──merged──▶ save ─▶ merged items
//!                                     │skipped / error
//!                                     ▼
//!                                naive items (not cached)
//! ```
//!
//! Steps run sequentially; the cache check decides whether the merge call
//! happens at all. Only a successful merge is written to the cache, so a
//! transient outage is never remembered as a decision. Concurrent calls for
//! the same event are not serialized: each recomputes and the last save
//! wins.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::cache::{is_fresh, GroceryCache};
use crate::combine::{combine, contributing_recipe_ids, CombineError};
use crate::merge::{encode_pre_combined, MergeError, MergeOutcome, MergeService};
use crate::models::{CombinedGroceryItem, RecipeIngredient, SmartGroceryItem};
use crate::pantry::{filter_pantry, PantryFiltered};

/// Why the naive result was returned instead of a merged one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    /// No ingredients; nothing to merge.
    Empty,
    /// The merge authority is not configured.
    MergeSkipped,
    /// The caller asked for the simple combine only.
    Bypassed,
    /// The merge call failed (transport, service error, or bad response).
    MergeFailed(String),
}

/// The list a caller should display, tagged with how it was produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GroceryList {
    Merged {
        items: Vec<SmartGroceryItem>,
        from_cache: bool,
    },
    Naive {
        items: Vec<CombinedGroceryItem>,
        fallback: FallbackReason,
    },
}

impl GroceryList {
    pub fn len(&self) -> usize {
        match self {
            Self::Merged { items, .. } => items.len(),
            Self::Naive { items, .. } => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_merged(&self) -> bool {
        matches!(self, Self::Merged { .. })
    }

    /// One-line status suitable for showing above the list.
    pub fn notice(&self) -> &'static str {
        match self {
            Self::Merged { from_cache: true, .. } => "Smart merge (cached)",
            Self::Merged { from_cache: false, .. } => "Smart merge",
            Self::Naive {
                fallback: FallbackReason::Empty,
                ..
            } => "No ingredients",
            Self::Naive {
                fallback: FallbackReason::Bypassed,
                ..
            } => "Simple combine (semantic merge bypassed)",
            Self::Naive { .. } => "Semantic merge unavailable, showing simple combine",
        }
    }

    /// Apply the pantry filter to whichever shape this list holds.
    ///
    /// Returns the filtered list and the number of items removed.
    pub fn without_pantry<S: AsRef<str>>(self, pantry_names: &[S]) -> (Self, usize) {
        match self {
            Self::Merged { items, from_cache } => {
                let PantryFiltered { items, removed } = filter_pantry(items, pantry_names);
                (Self::Merged { items, from_cache }, removed)
            }
            Self::Naive { items, fallback } => {
                let PantryFiltered { items, removed } = filter_pantry(items, pantry_names);
                (Self::Naive { items, fallback }, removed)
            }
        }
    }
}

/// Orchestrates naive combine, cache lookup, and semantic merge.
///
/// Dependencies are injected; there is no global state.
pub struct SmartCombiner {
    merge: Arc<dyn MergeService>,
    cache: Option<Arc<dyn GroceryCache>>,
}

impl SmartCombiner {
    /// A combiner with no cache: every call goes to the merge service.
    pub fn new(merge: Arc<dyn MergeService>) -> Self {
        Self { merge, cache: None }
    }

    pub fn with_cache(mut self, cache: Arc<dyn GroceryCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Build the shopping list for `event_id`.
    ///
    /// # Errors
    ///
    /// Only caller contract violations ([`CombineError`]) are returned.
    /// Merge and cache failures degrade to the naive list.
    pub async fn smart_combine(
        &self,
        event_id: &str,
        ingredients: &[RecipeIngredient],
        recipe_names: &HashMap<String, String>,
    ) -> Result<GroceryList, CombineError> {
        let naive = combine(ingredients, recipe_names)?;
        if naive.is_empty() {
            return Ok(GroceryList::Naive {
                items: naive,
                fallback: FallbackReason::Empty,
            });
        }

        let recipe_ids = contributing_recipe_ids(ingredients);
        let pre_combined = encode_pre_combined(&naive);

        if let Some(items) = self.cached_items(event_id, &recipe_ids).await {
            return Ok(GroceryList::Merged {
                items,
                from_cache: true,
            });
        }

        let outcome = self.merge.merge(&pre_combined).await;
        let items = match outcome {
            Ok(MergeOutcome::Merged(items)) if items.is_empty() => {
                tracing::error!(
                    event_id,
                    service = self.merge.name(),
                    naive_items = naive.len(),
                    "merge returned no items for a non-empty list"
                );
                return Ok(GroceryList::Naive {
                    items: naive,
                    fallback: FallbackReason::MergeFailed(
                        "merge service returned an empty list".to_string(),
                    ),
                });
            }
            Ok(MergeOutcome::Merged(items)) => items,
            Ok(MergeOutcome::Skipped) => {
                tracing::info!(event_id, service = self.merge.name(), "semantic merge skipped");
                return Ok(GroceryList::Naive {
                    items: naive,
                    fallback: FallbackReason::MergeSkipped,
                });
            }
            Err(err) => {
                log_merge_error(event_id, self.merge.name(), &err);
                return Ok(GroceryList::Naive {
                    items: naive,
                    fallback: FallbackReason::MergeFailed(err.to_string()),
                });
            }
        };

        tracing::info!(
            event_id,
            naive_items = naive.len(),
            merged_items = items.len(),
            "semantic merge complete"
        );

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.save(event_id, &items, &recipe_ids).await {
                tracing::warn!(event_id, error = %e, "grocery cache write failed");
            }
        }

        Ok(GroceryList::Merged {
            items,
            from_cache: false,
        })
    }

    /// Build the list with the naive combiner alone.
    ///
    /// Neither the cache nor the merge service is consulted.
    pub fn simple_combine(
        &self,
        ingredients: &[RecipeIngredient],
        recipe_names: &HashMap<String, String>,
    ) -> Result<GroceryList, CombineError> {
        let items = combine(ingredients, recipe_names)?;
        let fallback = if items.is_empty() {
            FallbackReason::Empty
        } else {
            FallbackReason::Bypassed
        };
        Ok(GroceryList::Naive { items, fallback })
    }

    /// Drop the cached snapshot for `event_id`, e.g. after a recipe is
    /// removed from the event. Failures are logged, not returned.
    pub async fn invalidate(&self, event_id: &str) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.delete(event_id).await {
                tracing::warn!(event_id, error = %e, "grocery cache delete failed");
            }
        }
    }

    async fn cached_items(
        &self,
        event_id: &str,
        recipe_ids: &[String],
    ) -> Option<Vec<SmartGroceryItem>> {
        let cache = self.cache.as_ref()?;
        match cache.load(event_id).await {
            Ok(Some(entry)) if is_fresh(&entry, recipe_ids) => {
                tracing::debug!(event_id, items = entry.items.len(), "grocery cache hit");
                Some(entry.items)
            }
            Ok(Some(entry)) => {
                tracing::debug!(
                    event_id,
                    cached = ?entry.recipe_ids,
                    current = ?recipe_ids,
                    "grocery cache stale"
                );
                None
            }
            Ok(None) => {
                tracing::debug!(event_id, "grocery cache miss");
                None
            }
            Err(e) => {
                tracing::warn!(event_id, error = %e, "grocery cache read failed");
                None
            }
        }
    }
}

fn log_merge_error(event_id: &str, service: &str, err: &MergeError) {
    match err {
        MergeError::Transport(_) => {
            tracing::warn!(event_id, service, error = %err, "merge service unreachable")
        }
        MergeError::Service(_) => {
            tracing::warn!(event_id, service, error = %err, "merge service returned an error")
        }
        MergeError::MalformedResponse(_) => {
            tracing::error!(event_id, service, error = %err, "merge response failed validation")
        }
    }
}
