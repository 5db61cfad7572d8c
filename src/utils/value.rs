use serde_json::Value;

/// Render an arbitrary JSON value as a display string.
///
/// Strings come through unquoted, objects with a `message` or `msg` field
/// collapse to that field, everything else uses its JSON text. Control
/// characters are stripped.
pub fn value_to_string(value: &Value) -> String {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Object(map) => match ["message", "msg"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
        {
            Some(text) => text.to_string(),
            None => value.to_string(),
        },
        other => other.to_string(),
    };
    sanitize(raw)
}

/// A non-empty string field of a JSON object, if present.
pub fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn sanitize(s: String) -> String {
    s.chars().filter(|c| !c.is_control()).collect()
}
