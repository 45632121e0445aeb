//! Shopping-list commands.
//!
//! Wires the configured cache and merge provider into a
//! [`SmartCombiner`], runs it for an event, applies the pantry filter, and
//! renders the category-grouped result. Used by `grocery list`,
//! `grocery export`, and the HTTP server.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use grocery_merge_core::cache::GroceryCache;
use grocery_merge_core::{
    group_by_category, CategoryGroup, CombinedGroceryItem, FallbackReason, GroceryLine,
    GroceryList, SmartCombiner, SmartGroceryItem,
};

use crate::config::Config;
use crate::db;
use crate::event::{load_event, load_pantry, Event};
use crate::merge_client::create_merge_service;
use crate::sqlite_cache::SqliteGroceryCache;

/// Build the orchestrator from configuration.
///
/// The cache is attached only when `cache.enabled` is set and the database
/// opens; otherwise every call goes to the merge service.
pub async fn build_combiner(config: &Config) -> Result<SmartCombiner> {
    let merge = create_merge_service(&config.merge)?;
    let combiner = SmartCombiner::new(merge);
    if !config.cache.enabled {
        return Ok(combiner);
    }
    match db::connect(config).await {
        Ok(pool) => {
            let cache: Arc<dyn GroceryCache> = Arc::new(SqliteGroceryCache::new(pool));
            Ok(combiner.with_cache(cache))
        }
        Err(e) => {
            tracing::warn!(error = %e, "grocery cache unavailable");
            Ok(combiner)
        }
    }
}

/// A grouped list after pantry filtering, ready for display or export.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GroupedList {
    Merged {
        from_cache: bool,
        groups: Vec<CategoryGroup<SmartGroceryItem>>,
    },
    Naive {
        fallback: FallbackReason,
        groups: Vec<CategoryGroup<CombinedGroceryItem>>,
    },
}

/// Everything a caller needs to render an event's shopping list.
#[derive(Debug, Clone, Serialize)]
pub struct ShoppingList {
    pub event_id: String,
    pub notice: String,
    pub pantry_removed: usize,
    pub list: GroupedList,
}

impl ShoppingList {
    fn from_list(event_id: &str, list: GroceryList, pantry: &[String]) -> Self {
        let notice = list.notice().to_string();
        let (list, pantry_removed) = list.without_pantry(pantry);
        let list = match list {
            GroceryList::Merged { items, from_cache } => GroupedList::Merged {
                from_cache,
                groups: group_by_category(items),
            },
            GroceryList::Naive { items, fallback } => GroupedList::Naive {
                fallback,
                groups: group_by_category(items),
            },
        };
        Self {
            event_id: event_id.to_string(),
            notice,
            pantry_removed,
            list,
        }
    }

    /// Flatten into display rows in grouped order.
    pub fn rows(&self) -> Vec<ListRow> {
        match &self.list {
            GroupedList::Merged { groups, .. } => rows_of(groups),
            GroupedList::Naive { groups, .. } => rows_of(groups),
        }
    }
}

/// One line of a rendered shopping list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRow {
    pub category: &'static str,
    pub name: String,
    pub quantity: String,
    pub unit: String,
    pub source_recipes: Vec<String>,
}

fn rows_of<T: GroceryLine>(groups: &[CategoryGroup<T>]) -> Vec<ListRow> {
    groups
        .iter()
        .flat_map(|g| {
            g.items.iter().map(move |item| ListRow {
                category: g.display_name,
                name: item.name().to_string(),
                quantity: item.display_quantity(),
                unit: item.unit().unwrap_or("").to_string(),
                source_recipes: item.source_recipes().to_vec(),
            })
        })
        .collect()
}

/// Produce the shopping list for an event.
///
/// With `naive_only`, the merge service and cache are bypassed entirely.
pub async fn shopping_list(
    combiner: &SmartCombiner,
    event: &Event,
    extra_pantry: &[String],
    naive_only: bool,
) -> Result<ShoppingList> {
    let list = if naive_only {
        combiner.simple_combine(&event.ingredients, &event.recipe_names)?
    } else {
        combiner
            .smart_combine(&event.event_id, &event.ingredients, &event.recipe_names)
            .await?
    };

    let mut pantry = event.pantry.clone();
    pantry.extend(extra_pantry.iter().cloned());
    Ok(ShoppingList::from_list(&event.event_id, list, &pantry))
}

/// Load an event file and optional pantry file, then build its list.
pub async fn load_shopping_list(
    config: &Config,
    event_path: &Path,
    pantry_path: Option<&Path>,
    naive_only: bool,
) -> Result<ShoppingList> {
    let event = load_event(event_path)?;
    let pantry = match pantry_path {
        Some(p) => load_pantry(p)?,
        None => Vec::new(),
    };
    let combiner = build_combiner(config).await?;
    shopping_list(&combiner, &event, &pantry, naive_only).await
}

/// `grocery list`: print the grouped list, or JSON with `--json`.
pub async fn run_list(
    config: &Config,
    event_path: &Path,
    pantry_path: Option<&Path>,
    naive_only: bool,
    json: bool,
) -> Result<()> {
    let list = load_shopping_list(config, event_path, pantry_path, naive_only).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    print!("{}", render_text(&list));
    Ok(())
}

/// Human-readable rendering, one section per category.
pub fn render_text(list: &ShoppingList) -> String {
    let mut out = String::new();
    out.push_str(&format!("Shopping list for {}\n", list.event_id));
    out.push_str(&format!("({})\n", list.notice));

    let mut current: Option<&str> = None;
    for row in list.rows() {
        if current != Some(row.category) {
            out.push_str(&format!("\n{}\n", row.category));
            current = Some(row.category);
        }
        let amount = match (row.quantity.as_str(), row.unit.as_str()) {
            (q, "") => q.to_string(),
            (q, u) => format!("{} {}", q, u),
        };
        out.push_str(&format!(
            "  - {} ({}) [{}]\n",
            row.name,
            amount,
            row.source_recipes.join(", ")
        ));
    }

    if list.pantry_removed > 0 {
        out.push_str(&format!(
            "\n{} item{} already in your pantry.\n",
            list.pantry_removed,
            if list.pantry_removed == 1 { "" } else { "s" }
        ));
    }
    out
}

/// `grocery cache show`: print the stored snapshot for an event.
pub async fn run_cache_show(config: &Config, event_id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let cache = SqliteGroceryCache::new(pool.clone());
    match cache.load(event_id).await? {
        Some(entry) => println!("{}", serde_json::to_string_pretty(&entry)?),
        None => println!("No cached list for event {}", event_id),
    }
    pool.close().await;
    Ok(())
}

/// `grocery cache clear`: drop the stored snapshot for an event.
pub async fn run_cache_clear(config: &Config, event_id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    SqliteGroceryCache::new(pool.clone()).delete(event_id).await?;
    pool.close().await;
    println!("Cleared cached list for event {}", event_id);
    Ok(())
}
