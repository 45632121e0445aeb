//! Semantic merge port and protocol.
//!
//! The semantic merge reconciles differently-worded mentions of the same
//! ingredient ("scallion" / "green onion"). It is delegated to an external,
//! non-deterministic authority behind the narrow [`MergeService`] trait so
//! the deterministic parts of the pipeline stay testable with a stub.
//!
//! This module owns everything about the exchange that does not need a
//! network stack: the request encoding ([`PreCombinedItem`]), the fixed
//! instruction set, and validation of the response body. Concrete HTTP
//! clients live in the application crate.
//!
//! # Wire format
//!
//! Request: `{ "preCombined": [PreCombinedItem] }` with quantities as
//! fraction strings. Responses:
//!
//! | Body | Meaning |
//! |------|---------|
//! | `{ "success": true, "items": [...] }` | merged items, plain decimal quantities |
//! | `{ "success": true, "skipped": true }` | merge authority not configured |
//! | `{ "success": false, "error": "..." }` | service-side failure |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::category::GroceryCategory;
use crate::models::{CombinedGroceryItem, SmartGroceryItem};
use crate::quantity::decimal_to_fraction;

/// Units the merge service may answer with.
pub const IMPERIAL_UNITS: [&str; 5] = ["tsp", "tbsp", "cup", "oz", "lb"];

/// Units the merge service must never answer with, in singular form.
pub const METRIC_UNITS: [&str; 24] = [
    "g", "gr", "gram", "gramme", "kg", "kilo", "kilogram", "kilogramme", "mg", "milligram",
    "milligramme", "ml", "milliliter", "millilitre", "l", "liter", "litre", "cl", "centiliter",
    "centilitre", "dl", "deciliter", "decilitre", "cc",
];

/// Whether `unit` names a metric unit in any common spelling
/// (`"g"`, `"Grams"`, `"kgs"`, `"millilitres"`, `"l."`).
pub fn is_metric_unit(unit: &str) -> bool {
    let unit = unit.trim().trim_end_matches('.').to_lowercase();
    let singular = match unit.strip_suffix('s') {
        Some(stem) if stem.len() >= 2 => stem,
        _ => unit.as_str(),
    };
    METRIC_UNITS.contains(&unit.as_str()) || METRIC_UNITS.contains(&singular)
}

/// Fixed instructions scoping the merge authority to semantic deduplication.
pub const MERGE_INSTRUCTIONS: &str = r#"You are consolidating a grocery shopping list that has already been combined by exact name and unit.

Your only job is SEMANTIC DEDUPLICATION: merge entries that are the same real-world ingredient worded differently (for example "scallion" and "green onion", or "garlic clove" and "garlic").

Rules:
- Do not invent quantities. When merged entries share a compatible unit, sum them. When units are incompatible (for example "head" and "clove"), keep the more useful entry and drop the other side's quantity; never guess a conversion.
- Leave entries that are not duplicates exactly as they are.
- Combine the sourceRecipes of merged entries, without duplicates.
- Return quantities as plain decimal numbers (1.5, not "1 1/2"). Use null when no quantity applies.
- Use only imperial units: tsp, tbsp, cup, oz, lb, or a count-style unit already present in the input. Never use g, kg, or ml.
- Use only these categories: produce, meat_seafood, dairy, pantry, spices, frozen, bakery, beverages, condiments, other.

Respond with ONLY a JSON array of objects with the fields name, totalQuantity, unit, category, sourceRecipes. No other text."#;

/// A naive item encoded for the merge request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreCombinedItem {
    pub name: String,
    /// Cooking-fraction rendering, e.g. `"1 1/2"`.
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub category: GroceryCategory,
    pub source_recipes: Vec<String>,
}

impl From<&CombinedGroceryItem> for PreCombinedItem {
    fn from(item: &CombinedGroceryItem) -> Self {
        Self {
            name: item.name.clone(),
            quantity: item.total_quantity.map(decimal_to_fraction),
            unit: item.unit.clone(),
            category: item.category,
            source_recipes: item.source_recipes.clone(),
        }
    }
}

/// Encode a naive result for the merge request.
pub fn encode_pre_combined(items: &[CombinedGroceryItem]) -> Vec<PreCombinedItem> {
    items.iter().map(PreCombinedItem::from).collect()
}

/// Request body sent to a merge service endpoint.
pub fn merge_request_body(pre_combined: &[PreCombinedItem]) -> Value {
    serde_json::json!({ "preCombined": pre_combined })
}

/// Successful outcomes of a merge call.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    Merged(Vec<SmartGroceryItem>),
    /// The merge authority is not configured. Expected, not an error.
    Skipped,
}

/// Hard failures of a merge call.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Network-level failure or non-success HTTP status.
    #[error("merge service transport error: {0}")]
    Transport(String),
    /// The service answered with `success: false`.
    #[error("merge service reported an error: {0}")]
    Service(String),
    /// The response body failed validation.
    #[error("malformed merge response: {0}")]
    MalformedResponse(String),
}

/// An external semantic-merge authority.
///
/// Implementations make a single attempt per call; retries are
/// deliberately absent since the pipeline falls back to the naive result.
#[async_trait]
pub trait MergeService: Send + Sync {
    /// Short identifier used in logs (e.g. `"service"`, `"openai"`).
    fn name(&self) -> &str;

    async fn merge(&self, pre_combined: &[PreCombinedItem]) -> Result<MergeOutcome, MergeError>;
}

/// A merge service that is not configured and always skips.
pub struct DisabledMergeService;

#[async_trait]
impl MergeService for DisabledMergeService {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn merge(&self, _pre_combined: &[PreCombinedItem]) -> Result<MergeOutcome, MergeError> {
        Ok(MergeOutcome::Skipped)
    }
}

/// Interpret a merge service envelope (`success` / `skipped` / `items`).
pub fn parse_merge_envelope(body: &Value) -> Result<MergeOutcome, MergeError> {
    let obj = body
        .as_object()
        .ok_or_else(|| MergeError::MalformedResponse("response is not a JSON object".into()))?;

    let success = obj
        .get("success")
        .and_then(Value::as_bool)
        .ok_or_else(|| MergeError::MalformedResponse("missing boolean 'success'".into()))?;

    if !success {
        let message = obj
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unspecified error");
        return Err(MergeError::Service(message.to_string()));
    }

    if obj.get("skipped").and_then(Value::as_bool) == Some(true) {
        return Ok(MergeOutcome::Skipped);
    }

    let items = obj
        .get("items")
        .ok_or_else(|| MergeError::MalformedResponse("missing 'items'".into()))?;
    parse_merged_items(items).map(MergeOutcome::Merged)
}

/// Extract and validate the item array from free-form model output.
///
/// Chat models sometimes wrap the array in a Markdown code fence; the
/// fence is stripped before parsing. Nothing else is forgiven.
pub fn parse_merged_items_text(text: &str) -> Result<Vec<SmartGroceryItem>, MergeError> {
    let trimmed = strip_code_fence(text.trim());
    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| MergeError::MalformedResponse(format!("invalid JSON: {}", e)))?;
    parse_merged_items(&value)
}

/// Validate a JSON array against the [`SmartGroceryItem`] shape.
///
/// Every element must carry a non-empty `name`, a `totalQuantity` (or
/// `quantity`) that is a number or `null`, a `unit` that is a string or
/// `null`, a known `category`, and a `sourceRecipes` string array.
/// Metric units are rejected.
pub fn parse_merged_items(value: &Value) -> Result<Vec<SmartGroceryItem>, MergeError> {
    let array = value
        .as_array()
        .ok_or_else(|| MergeError::MalformedResponse("items is not an array".into()))?;

    array
        .iter()
        .enumerate()
        .map(|(i, v)| {
            validate_item(v)
                .map_err(|e| MergeError::MalformedResponse(format!("item {}: {}", i, e)))
        })
        .collect()
}

fn validate_item(value: &Value) -> Result<SmartGroceryItem, String> {
    let obj = value.as_object().ok_or("not an object")?;

    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or("missing or empty 'name'")?;

    let quantity = obj
        .get("totalQuantity")
        .or_else(|| obj.get("quantity"))
        .ok_or("missing 'totalQuantity'")?;
    let total_quantity = match quantity {
        Value::Null => None,
        Value::Number(n) => Some(
            n.as_f64()
                .filter(|q| q.is_finite() && *q >= 0.0)
                .ok_or("'totalQuantity' is not a non-negative number")?,
        ),
        Value::String(s) => return Err(format!("'totalQuantity' must be a number, got \"{}\"", s)),
        _ => return Err("'totalQuantity' must be a number or null".into()),
    };

    let unit = match obj.get("unit") {
        None | Some(Value::Null) => None,
        Some(Value::String(u)) if u.trim().is_empty() => None,
        Some(Value::String(u)) => {
            let u = u.trim();
            if is_metric_unit(u) {
                return Err(format!("metric unit '{}' is not allowed", u));
            }
            Some(u.to_string())
        }
        Some(_) => return Err("'unit' must be a string or null".into()),
    };

    let category = obj
        .get("category")
        .and_then(Value::as_str)
        .ok_or("missing 'category'")?
        .parse::<GroceryCategory>()
        .map_err(|e| e.to_string())?;

    let source_recipes = obj
        .get("sourceRecipes")
        .and_then(Value::as_array)
        .ok_or("missing 'sourceRecipes' array")?
        .iter()
        .map(|r| r.as_str().map(str::to_string))
        .collect::<Option<Vec<String>>>()
        .ok_or("'sourceRecipes' must contain only strings")?;

    Ok(SmartGroceryItem {
        name: name.to_string(),
        total_quantity,
        unit,
        category,
        source_recipes,
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn combined(name: &str, qty: Option<f64>) -> CombinedGroceryItem {
        CombinedGroceryItem {
            name: name.to_string(),
            total_quantity: qty,
            unit: Some("cup".to_string()),
            category: GroceryCategory::Pantry,
            source_recipes: vec!["Recipe A".to_string()],
        }
    }

    #[test]
    fn test_encode_uses_fractions() {
        let pre = encode_pre_combined(&[combined("flour", Some(1.5)), combined("sugar", None)]);
        assert_eq!(pre[0].quantity.as_deref(), Some("1 1/2"));
        assert_eq!(pre[1].quantity, None);

        let body = merge_request_body(&pre);
        assert_eq!(body["preCombined"][0]["quantity"], "1 1/2");
        assert_eq!(body["preCombined"][0]["sourceRecipes"][0], "Recipe A");
        assert!(body["preCombined"][1]["quantity"].is_null());
    }

    #[test]
    fn test_envelope_success() {
        let body = json!({
            "success": true,
            "items": [{
                "name": "green onion",
                "totalQuantity": 3,
                "unit": null,
                "category": "produce",
                "sourceRecipes": ["Recipe A", "Recipe B"]
            }]
        });
        match parse_merge_envelope(&body).unwrap() {
            MergeOutcome::Merged(items) => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].total_quantity, Some(3.0));
                assert_eq!(items[0].source_recipes.len(), 2);
            }
            other => panic!("expected merged, got {:?}", other),
        }
    }

    #[test]
    fn test_envelope_skipped() {
        let body = json!({ "success": true, "skipped": true });
        assert_eq!(parse_merge_envelope(&body).unwrap(), MergeOutcome::Skipped);
    }

    #[test]
    fn test_envelope_error() {
        let body = json!({ "success": false, "error": "rate limited" });
        match parse_merge_envelope(&body) {
            Err(MergeError::Service(msg)) => assert_eq!(msg, "rate limited"),
            other => panic!("expected service error, got {:?}", other),
        }
    }

    #[test]
    fn test_envelope_missing_items_is_malformed() {
        let body = json!({ "success": true });
        assert!(matches!(
            parse_merge_envelope(&body),
            Err(MergeError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_merge_envelope(&json!([])),
            Err(MergeError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_fraction_string_quantity_rejected() {
        let items = json!([{
            "name": "flour", "totalQuantity": "1 1/2", "unit": "cup",
            "category": "pantry", "sourceRecipes": []
        }]);
        assert!(matches!(
            parse_merged_items(&items),
            Err(MergeError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_missing_quantity_field_rejected() {
        let items = json!([{
            "name": "flour", "unit": "cup", "category": "pantry", "sourceRecipes": []
        }]);
        assert!(parse_merged_items(&items).is_err());
    }

    #[test]
    fn test_unknown_category_rejected() {
        let items = json!([{
            "name": "chips", "totalQuantity": 1, "unit": null,
            "category": "snacks", "sourceRecipes": []
        }]);
        let err = parse_merged_items(&items).unwrap_err().to_string();
        assert!(err.contains("snacks"), "{}", err);
    }

    #[test]
    fn test_metric_unit_rejected() {
        let items = json!([{
            "name": "flour", "totalQuantity": 250, "unit": "g",
            "category": "pantry", "sourceRecipes": []
        }]);
        assert!(parse_merged_items(&items).is_err());
    }

    #[test]
    fn test_spelled_out_metric_units_rejected() {
        for unit in ["grams", "gram", "Kilogram", "kgs", "milliliters", "millilitres", "liter", "L."] {
            let items = json!([{
                "name": "flour", "totalQuantity": 1, "unit": unit,
                "category": "pantry", "sourceRecipes": []
            }]);
            assert!(parse_merged_items(&items).is_err(), "accepted {}", unit);
        }
    }

    #[test]
    fn test_imperial_and_count_units_accepted() {
        for unit in ["cups", "tbsp", "lbs", "oz", "clove", "cloves", "can", "bunch", "slices"] {
            assert!(!is_metric_unit(unit), "rejected {}", unit);
        }
    }

    #[test]
    fn test_quantity_alias_and_null_unit_accepted() {
        let items = json!([{
            "name": "egg", "quantity": null, "unit": "",
            "category": "dairy", "sourceRecipes": ["Recipe A"]
        }]);
        let parsed = parse_merged_items(&items).unwrap();
        assert_eq!(parsed[0].total_quantity, None);
        assert_eq!(parsed[0].unit, None);
    }

    #[test]
    fn test_text_with_code_fence() {
        let text = "```json\n[{\"name\":\"salt\",\"totalQuantity\":1,\"unit\":\"tsp\",\"category\":\"spices\",\"sourceRecipes\":[\"A\"]}]\n```";
        let items = parse_merged_items_text(text).unwrap();
        assert_eq!(items[0].unit.as_deref(), Some("tsp"));
    }

    #[test]
    fn test_text_with_prose_rejected() {
        assert!(parse_merged_items_text("Here is your list: []").is_err());
    }

    #[tokio::test]
    async fn test_disabled_service_skips() {
        let outcome = DisabledMergeService.merge(&[]).await.unwrap();
        assert_eq!(outcome, MergeOutcome::Skipped);
    }
}
