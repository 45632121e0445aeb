//! Semantic merge clients.
//!
//! Concrete [`MergeService`] implementations selected by `merge.provider`:
//! - **`disabled`**: [`DisabledMergeService`]; every call is skipped.
//! - **`service`**: [`HttpMergeService`]; posts `{ "preCombined": [...] }`
//!   to a merge endpoint that answers with the success/skipped/error
//!   envelope.
//! - **`openai`**: [`OpenAiMergeService`]; sends the fixed merge
//!   instructions to the chat completions API and validates the returned
//!   JSON array.
//!
//! # Single attempt
//!
//! Each merge is one request with no retry or backoff. A failed merge
//! falls back to the naive list.
//!
//! # Error mapping
//!
//! | Condition | Result |
//! |-----------|--------|
//! | Provider disabled, API key unset, or service says `skipped` | `Ok(Skipped)` |
//! | Connection failure, timeout, non-2xx without an envelope | `Err(Transport)` |
//! | `{ "success": false }` | `Err(Service)` |
//! | Body fails validation | `Err(MalformedResponse)` |

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use grocery_merge_core::merge::{
    merge_request_body, parse_merge_envelope, parse_merged_items_text, DisabledMergeService,
    MergeError, MergeOutcome, MergeService, PreCombinedItem, MERGE_INSTRUCTIONS,
};

use crate::config::MergeConfig;

/// Environment variable holding the bearer token for the merge service.
pub const MERGE_TOKEN_ENV: &str = "GROCERY_MERGE_TOKEN";
/// Environment variable holding the OpenAI API key.
pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

const OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Build the merge service named by the configuration.
pub fn create_merge_service(config: &MergeConfig) -> Result<Arc<dyn MergeService>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledMergeService)),
        "service" => {
            let url = config
                .url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("merge.url required for service provider"))?;
            let token = std::env::var(MERGE_TOKEN_ENV).ok();
            Ok(Arc::new(HttpMergeService::new(url, token, config.timeout_secs)?))
        }
        "openai" => {
            let model = config
                .model
                .clone()
                .ok_or_else(|| anyhow::anyhow!("merge.model required for openai provider"))?;
            let base_url = config
                .url
                .clone()
                .unwrap_or_else(|| OPENAI_BASE_URL.to_string());
            let api_key = std::env::var(OPENAI_KEY_ENV).ok();
            Ok(Arc::new(OpenAiMergeService::new(
                base_url,
                model,
                api_key,
                config.timeout_secs,
            )?))
        }
        other => anyhow::bail!("Unknown merge provider: {}", other),
    }
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

// ============ Merge Service ============

/// Client for a dedicated merge endpoint speaking the envelope protocol.
pub struct HttpMergeService {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpMergeService {
    pub fn new(url: String, token: Option<String>, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            url,
            token,
        })
    }
}

#[async_trait]
impl MergeService for HttpMergeService {
    fn name(&self) -> &str {
        "service"
    }

    async fn merge(&self, pre_combined: &[PreCombinedItem]) -> Result<MergeOutcome, MergeError> {
        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&merge_request_body(pre_combined));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MergeError::Transport(e.to_string()))?;
        let status = response.status();
        let body_text = response
            .text()
            .await
            .map_err(|e| MergeError::Transport(e.to_string()))?;

        let parsed = serde_json::from_str::<Value>(&body_text);

        if status.is_success() {
            let body = parsed.map_err(|e| {
                MergeError::MalformedResponse(format!("response is not JSON: {}", e))
            })?;
            return parse_merge_envelope(&body);
        }

        // Error statuses may still carry `{ "success": false, "error": ... }`.
        match parsed {
            Ok(body) if body.get("success") == Some(&Value::Bool(false)) => {
                parse_merge_envelope(&body)
            }
            _ => Err(MergeError::Transport(format!(
                "merge service returned {}: {}",
                status,
                truncate(&body_text, 200)
            ))),
        }
    }
}

// ============ OpenAI ============

/// Merge authority backed by an OpenAI-compatible chat completions API.
///
/// A missing API key counts as "not configured" and yields
/// [`MergeOutcome::Skipped`] rather than an error.
pub struct OpenAiMergeService {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiMergeService {
    pub fn new(
        base_url: String,
        model: String,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }
}

#[async_trait]
impl MergeService for OpenAiMergeService {
    fn name(&self) -> &str {
        "openai"
    }

    async fn merge(&self, pre_combined: &[PreCombinedItem]) -> Result<MergeOutcome, MergeError> {
        let Some(api_key) = &self.api_key else {
            return Ok(MergeOutcome::Skipped);
        };

        let list = serde_json::to_string(pre_combined)
            .map_err(|e| MergeError::MalformedResponse(e.to_string()))?;
        let body = serde_json::json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                { "role": "system", "content": MERGE_INSTRUCTIONS },
                { "role": "user", "content": list },
            ],
        });

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| MergeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(MergeError::Transport(format!(
                "OpenAI API error {}: {}",
                status,
                truncate(&body_text, 200)
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| MergeError::MalformedResponse(e.to_string()))?;
        let content = json
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                MergeError::MalformedResponse("missing choices[0].message.content".into())
            })?;

        parse_merged_items_text(content).map(MergeOutcome::Merged)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        format!("{}…", text.chars().take(max_chars).collect::<String>())
    }
}
