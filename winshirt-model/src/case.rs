//! Key rewriting between the two naming conventions.
//!
//! The remote schema names columns in `underscore_case`; the local cache and
//! the in-memory model use `camelCase`. These functions are the only place
//! where a record crosses from one convention to the other.
//!
//! Both directions rewrite mapping keys only. Arrays are walked so that
//! mappings nested inside them are rewritten too; every other value
//! (strings, numbers, booleans, `null`) is returned unchanged.

use serde_json::{Map, Value};

/// Rewrites every mapping key from `camelCase` to `underscore_case`.
///
/// `visualCategoryId` becomes `visual_category_id`. Applying it twice gives
/// the same result as applying it once.
pub fn to_underscore(value: &Value) -> Value {
    rewrite_keys(value, camel_to_underscore)
}

/// Rewrites every mapping key from `underscore_case` to `camelCase`.
///
/// `visual_category_id` becomes `visualCategoryId`. Applying it twice gives
/// the same result as applying it once.
pub fn to_camel(value: &Value) -> Value {
    rewrite_keys(value, underscore_to_camel)
}

/// Map-level variant of [`to_underscore`].
pub fn map_to_underscore(map: &Map<String, Value>) -> Map<String, Value> {
    rewrite_map(map, camel_to_underscore)
}

/// Map-level variant of [`to_camel`].
pub fn map_to_camel(map: &Map<String, Value>) -> Map<String, Value> {
    rewrite_map(map, underscore_to_camel)
}

/// Inserts `_` before every ASCII uppercase letter and lower-cases it.
///
/// Consecutive capitals are not grouped: `userID` becomes `user_i_d`.
pub fn camel_to_underscore(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Drops every `_` that precedes an ASCII lowercase letter and upper-cases
/// that letter. Any other `_` is kept as is.
pub fn underscore_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '_' {
            if let Some(next) = chars.next_if(|c| c.is_ascii_lowercase()) {
                out.push(next.to_ascii_uppercase());
                continue;
            }
        }
        out.push(ch);
    }
    out
}

fn rewrite_keys(value: &Value, rename: fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => Value::Object(rewrite_map(map, rename)),
        Value::Array(items) => Value::Array(items.iter().map(|v| rewrite_keys(v, rename)).collect()),
        other => other.clone(),
    }
}

fn rewrite_map(map: &Map<String, Value>, rename: fn(&str) -> String) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| (rename(key), rewrite_keys(value, rename)))
        .collect()
}
