use serde_json::Value;

/// Parse a field's text as a typed JSON literal, falling back to the raw
/// string. Best-effort and never a validation failure: `42` becomes a
/// number, `{"a":1}` a mapping, `true` a bool, anything else stays text.
pub fn literal(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Text form of a schema default for pre-filling an editable field.
pub fn display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
