//! Best-effort coercion of loosely typed JSON.
//!
//! The EBS stores state values as whatever the extension front-end sent, which
//! frequently means JSON documents serialized into strings, sometimes several
//! levels deep. These helpers recover the structured value where possible and
//! fall back to the raw text otherwise. None of them fail.

use serde_json::{Map, Value};

/// Parse `text` as JSON and coerce the result. Text that is not JSON comes back
/// as a JSON string.
pub fn parse_value(text: &str) -> Value {
    match serde_json::from_str::<Value>(text) {
        Ok(parsed) => coerce_value(parsed),
        Err(_) => Value::String(text.to_string()),
    }
}

/// Recursively replace string leaves that hold JSON with the parsed value.
pub fn coerce_value(value: Value) -> Value {
    match value {
        Value::String(s) => coerce_string(s),
        Value::Array(items) => Value::Array(items.into_iter().map(coerce_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, coerce_value(v)))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

fn coerce_string(s: String) -> Value {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Value::String(s);
    }
    match serde_json::from_str::<Value>(trimmed) {
        // A double-encoded object or array unwraps; a quoted plain string is
        // kept as written.
        Ok(Value::String(inner)) => match coerce_string(inner) {
            Value::String(_) => Value::String(s),
            recovered => recovered,
        },
        Ok(parsed) => coerce_value(parsed),
        Err(_) => Value::String(s),
    }
}
