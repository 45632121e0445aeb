//! SQLite-backed [`GroceryCache`] implementation.
//!
//! One row per event in `grocery_cache`. `items` and `recipe_ids` are stored
//! as JSON text; `updated_at` is a Unix timestamp. Saves are upserts on
//! `event_id` and overwrite unconditionally.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use grocery_merge_core::cache::{canonical_recipe_ids, GroceryCache};
use grocery_merge_core::models::{GroceryCacheEntry, SmartGroceryItem};

/// SQLite implementation of the [`GroceryCache`] trait.
pub struct SqliteGroceryCache {
    pool: SqlitePool,
}

impl SqliteGroceryCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroceryCache for SqliteGroceryCache {
    async fn load(&self, event_id: &str) -> Result<Option<GroceryCacheEntry>> {
        let row = sqlx::query(
            "SELECT event_id, items, recipe_ids, updated_at FROM grocery_cache WHERE event_id = ?",
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items_json: String = row.try_get("items")?;
        let ids_json: String = row.try_get("recipe_ids")?;
        let updated_at: i64 = row.try_get("updated_at")?;

        let items: Vec<SmartGroceryItem> = serde_json::from_str(&items_json)
            .with_context(|| format!("corrupt cached items for event {}", event_id))?;
        let recipe_ids: Vec<String> = serde_json::from_str(&ids_json)
            .with_context(|| format!("corrupt cached recipe ids for event {}", event_id))?;

        Ok(Some(GroceryCacheEntry {
            event_id: row.try_get("event_id")?,
            items,
            recipe_ids,
            updated_at: DateTime::from_timestamp(updated_at, 0).unwrap_or_default(),
        }))
    }

    async fn save(
        &self,
        event_id: &str,
        items: &[SmartGroceryItem],
        recipe_ids: &[String],
    ) -> Result<()> {
        let items_json = serde_json::to_string(items)?;
        let ids_json = serde_json::to_string(&canonical_recipe_ids(recipe_ids))?;
        let now = Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO grocery_cache (event_id, items, recipe_ids, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(event_id) DO UPDATE SET
                items = excluded.items,
                recipe_ids = excluded.recipe_ids,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(event_id)
        .bind(&items_json)
        .bind(&ids_json)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, event_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM grocery_cache WHERE event_id = ?")
            .bind(event_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::apply_schema;
    use grocery_merge_core::GroceryCategory;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;
    use tempfile::TempDir;

    async fn test_pool(tmp: &TempDir) -> SqlitePool {
        let path = tmp.path().join("cache.sqlite");
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .unwrap()
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        apply_schema(&pool).await.unwrap();
        pool
    }

    fn item(name: &str, qty: Option<f64>) -> SmartGroceryItem {
        SmartGroceryItem {
            name: name.to_string(),
            total_quantity: qty,
            unit: Some("cup".to_string()),
            category: GroceryCategory::Pantry,
            source_recipes: vec!["Recipe A".to_string(), "Recipe B".to_string()],
        }
    }

    #[tokio::test]
    async fn test_round_trip_preserves_items_and_sorts_ids() {
        let tmp = TempDir::new().unwrap();
        let cache = SqliteGroceryCache::new(test_pool(&tmp).await);

        let items = vec![item("flour", Some(2.5)), item("sugar", None)];
        cache
            .save("evt-1", &items, &["r2".to_string(), "r1".to_string()])
            .await
            .unwrap();

        let entry = cache.load("evt-1").await.unwrap().unwrap();
        assert_eq!(entry.event_id, "evt-1");
        assert_eq!(entry.items, items);
        assert_eq!(entry.recipe_ids, vec!["r1", "r2"]);
        assert!(entry.updated_at.timestamp() > 0);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_previous_snapshot() {
        let tmp = TempDir::new().unwrap();
        let pool = test_pool(&tmp).await;
        let cache = SqliteGroceryCache::new(pool.clone());

        cache.save("evt-1", &[item("flour", Some(1.0))], &["r1".to_string()]).await.unwrap();
        cache.save("evt-1", &[item("rice", Some(3.0))], &["r3".to_string()]).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM grocery_cache")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);

        let entry = cache.load("evt-1").await.unwrap().unwrap();
        assert_eq!(entry.items[0].name, "rice");
        assert_eq!(entry.recipe_ids, vec!["r3"]);
    }

    #[tokio::test]
    async fn test_delete_and_missing_event() {
        let tmp = TempDir::new().unwrap();
        let cache = SqliteGroceryCache::new(test_pool(&tmp).await);

        assert!(cache.load("nope").await.unwrap().is_none());
        cache.save("evt-1", &[], &[]).await.unwrap();
        cache.delete("evt-1").await.unwrap();
        cache.delete("evt-1").await.unwrap();
        assert!(cache.load("evt-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_table_is_an_error_not_a_panic() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty.sqlite");
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .unwrap()
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await.unwrap();
        let cache = SqliteGroceryCache::new(pool);
        assert!(cache.load("evt-1").await.is_err());
        assert!(cache.save("evt-1", &[], &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_mistyped_column_is_an_error_not_a_panic() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("odd.sqlite");
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .unwrap()
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await.unwrap();
        sqlx::query(
            "CREATE TABLE grocery_cache (event_id TEXT PRIMARY KEY, items INTEGER, recipe_ids INTEGER, updated_at TEXT)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO grocery_cache VALUES ('evt-1', 42, 7, 'yesterday')")
            .execute(&pool)
            .await
            .unwrap();

        let cache = SqliteGroceryCache::new(pool);
        assert!(cache.load("evt-1").await.is_err());
    }
}
