//! TOML configuration parsing and validation.
//!
//! ```toml
//! [db]
//! path = "./data/grocery.sqlite"
//!
//! [merge]
//! provider = "service"        # disabled | service | openai
//! url = "https://example.com/functions/v1/merge-grocery"
//! timeout_secs = 30
//!
//! [cache]
//! enabled = true
//!
//! [server]
//! bind = "127.0.0.1:7340"
//! ```
//!
//! Only `[db]` is required. Secrets are read from the environment, never
//! from the file: `GROCERY_MERGE_TOKEN` for the merge service and
//! `OPENAI_API_KEY` for the OpenAI provider.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub merge: MergeConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// Semantic merge provider settings.
#[derive(Debug, Deserialize, Clone)]
pub struct MergeConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Endpoint for the `service` provider, or an OpenAI-compatible base
    /// URL override for the `openai` provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            url: None,
            model: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.merge.timeout_secs == 0 {
        anyhow::bail!("merge.timeout_secs must be > 0");
    }

    match config.merge.provider.as_str() {
        "disabled" => {}
        "service" => {
            if config.merge.url.as_deref().map_or(true, |u| u.trim().is_empty()) {
                anyhow::bail!("merge.url must be specified when provider is 'service'");
            }
        }
        "openai" => {
            if config.merge.model.is_none() {
                anyhow::bail!("merge.model must be specified when provider is 'openai'");
            }
        }
        other => anyhow::bail!(
            "Unknown merge provider: '{}'. Must be disabled, service, or openai.",
            other
        ),
    }

    Ok(config)
}
