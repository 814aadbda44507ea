//! Response envelope normalization
//!
//! List endpoints answer with one of three shapes:
//!
//! ```json
//! [ {...}, {...} ]
//! { "rows": [ {...} ] }
//! { "data": [ {...} ] }
//! ```
//!
//! Object endpoints answer either with the bare object or `{ "data": {...} }`.
//! Everything is flattened here so nothing past this module sees the envelope.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Keys that may wrap a list body
const LIST_KEYS: [&str; 2] = ["rows", "data"];

/// Pull the array out of any known envelope. Anything else yields an empty list.
pub fn extract_list(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            for key in LIST_KEYS {
                if let Some(Value::Array(items)) = map.remove(key) {
                    return items;
                }
            }
            tracing::warn!("List response has no rows/data array, treating as empty");
            Vec::new()
        }
        Value::Null => Vec::new(),
        other => {
            tracing::warn!(kind = value_kind(&other), "Unexpected list response shape");
            Vec::new()
        }
    }
}

/// Decode a list body, skipping elements that do not match `T`.
pub fn decode_list<T: DeserializeOwned>(body: Value) -> Vec<T> {
    extract_list(body)
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<T>(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping malformed list element");
                None
            }
        })
        .collect()
}

/// Unwrap `{ "data": {...} }` when present, otherwise return the body as-is.
pub fn extract_object(body: Value) -> Value {
    match body {
        Value::Object(mut map) if matches!(map.get("data"), Some(Value::Object(_))) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Decode an object body through [`extract_object`].
pub fn decode_object<T: DeserializeOwned>(body: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(extract_object(body))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
