//! Robust JSON extraction from LLM responses (spec §4.2 step 2). Grounded
//! on `original_source/apps/api/utils/json_extraction.py`'s layered
//! strategy: pure JSON, fenced ```json blocks, fenced generic blocks,
//! regex-located array/object, then dict-to-list promotion.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static JSON_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```json\s*\n?(.*?)\n?```").unwrap());
static GENERIC_BLOCK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```\s*\n?(.*?)\n?```").unwrap());
static JSON_ARRAY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[.*\]").unwrap());
static JSON_OBJECT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Extract a JSON value from a raw LLM response, tolerating markdown
/// fencing and surrounding prose. When `expect_list` is set and the
/// recovered value is a bare object, it is promoted to a one-element array
/// (spec §4.2 step 2: "emitted as a single object (auto-wrap to
/// one-element array)"). Returns `None` rather than an error — malformed
/// JSON is a warning, not an exception (spec §4.2's failure semantics).
#[must_use]
pub fn extract_json_from_response(response: &str, expect_list: bool) -> Option<Value> {
    let text = response.trim();
    if text.is_empty() {
        return None;
    }

    let mut result = serde_json::from_str::<Value>(text).ok();

    if result.is_none() {
        if let Some(caps) = JSON_BLOCK_RE.captures(text) {
            result = serde_json::from_str(caps[1].trim()).ok();
        }
    }

    if result.is_none() {
        if let Some(caps) = GENERIC_BLOCK_RE.captures(text) {
            result = serde_json::from_str(caps[1].trim()).ok();
        }
    }

    if result.is_none() {
        if let Some(m) = JSON_ARRAY_RE.find(text) {
            result = serde_json::from_str(m.as_str()).ok();
        }
    }

    if result.is_none() {
        if let Some(m) = JSON_OBJECT_RE.find(text) {
            result = serde_json::from_str(m.as_str()).ok();
        }
    }

    match result {
        Some(Value::Object(obj)) if expect_list => {
            tracing::info!("converting single decision object to one-element array");
            Some(Value::Array(vec![Value::Object(obj)]))
        }
        Some(value) => Some(value),
        None => {
            tracing::warn!(
                response_len = text.len(),
                preview = %text.chars().take(200).collect::<String>(),
                "failed to extract JSON from LLM response"
            );
            None
        }
    }
}

/// As `extract_json_from_response`, but returns `default` instead of
/// `None` on failure (mirrors `extract_json_or_default`).
pub fn extract_json_or_default(response: &str, default: Value) -> Value {
    extract_json_from_response(response, false).unwrap_or(default)
}
