//! # Grocery Merge
//!
//! Turns the ingredients of every recipe planned for an event into a single
//! shopping list.
//!
//! The pure pipeline (combine, pantry filter, category grouping, merge
//! validation, cache freshness) lives in `grocery-merge-core`. This crate
//! supplies the adapters around it: TOML config, the SQLite merge cache,
//! HTTP merge providers, event file loading, and the CLI and HTTP surfaces.
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ event.json │──▶│ SmartCombiner│──▶│ grouped list │
//! └────────────┘   └──────┬───────┘   └──────┬───────┘
//!                         │                  │
//!               ┌─────────┴──────┐     ┌─────┴─────┐
//!               ▼                ▼     ▼           ▼
//!         ┌──────────┐   ┌───────────┐ ┌─────┐ ┌──────┐
//!         │  SQLite  │   │  merge    │ │ CLI │ │ HTTP │
//!         │  cache   │   │  service  │ └─────┘ └──────┘
//!         └──────────┘   └───────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_cache`] | SQLite-backed merge cache |
//! | [`merge_client`] | HTTP merge providers |
//! | [`event`] | Event and pantry file loading |
//! | [`grocery`] | List building and text rendering |
//! | [`export`] | CSV export |
//! | [`server`] | HTTP server |

pub mod config;
pub mod db;
pub mod event;
pub mod export;
pub mod grocery;
pub mod merge_client;
pub mod migrate;
pub mod server;
pub mod sqlite_cache;

pub use grocery_merge_core::cache::GroceryCache;
pub use grocery_merge_core::{GroceryList, SmartCombiner};
