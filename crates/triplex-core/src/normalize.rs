//! Text and entity-name normalization
//!
//! Both functions are pure, total and idempotent. Upstream extraction jobs
//! frequently split names across lines or pad them with stray spaces, so entity
//! names drop whitespace entirely while human-readable text only collapses it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static LINE_BREAKS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n]+").unwrap());
static WHITESPACE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Normalize a human-readable value.
///
/// Removes line breaks, collapses whitespace runs to one space and trims.
pub fn normalize_text(text: &str) -> String {
    let without_breaks = LINE_BREAKS_RE.replace_all(text, "");
    let collapsed = WHITESPACE_RUN_RE.replace_all(&without_breaks, " ");
    collapsed.trim().to_string()
}

/// Normalize an entity name for identity comparison and storage.
///
/// Removes line breaks and every whitespace character, so `"高血 压\n"` and
/// `"高血压"` resolve to the same node.
pub fn normalize_name(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

/// String form of an arbitrary JSON value.
///
/// Strings pass through untouched, `null` becomes the empty string, and every
/// other value uses its compact JSON rendering.
pub fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
