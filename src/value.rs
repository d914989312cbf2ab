//! Helpers over `serde_json::Value`
//!
//! All dynamic data in the framework (element properties, event payloads,
//! expression results, pending binding writes) flows as `serde_json::Value`.

use serde_json::Value;

/// String form of a value as it appears in rendered output.
///
/// Strings render raw (no quotes); everything else renders in JSON form.
pub fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Coerce a value to a boolean the way attribute inputs expect.
///
/// `true`/`false` map directly; the strings `"true"`/`"false"` are accepted
/// because plain (non-bracketed) attributes always arrive as strings.
pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s == "true" => Some(true),
        Value::String(s) if s == "false" => Some(false),
        _ => None,
    }
}

/// Coerce a value to an integer, accepting both numbers and numeric strings.
pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Coerce a value to a string, rejecting non-scalars.
pub fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
