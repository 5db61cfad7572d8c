//! Turns whatever the API sent back into a `RequestResult`.
//!
//! The upstream API is inconsistent about where it puts error text, so
//! failures are resolved through an ordered list of extraction rules.

use reqwest::StatusCode;
use serde_json::Value;
use tracing::trace;

use crate::models::RequestResult;
use crate::utils::value::{str_field, value_to_string};

const NETWORK_ERROR: &str = "Network error occurred";

/// An extraction rule: a name for logs and the function that tries it.
type ErrorRule = (&'static str, fn(&Value) -> Option<String>);

/// Checked in order; the first rule that yields text wins.
const ERROR_RULES: &[ErrorRule] = &[
    ("message", message_field),
    ("error", error_field),
    ("detail", detail_field),
    ("errors", errors_field),
    ("body", string_body),
];

/// Normalizes a raw HTTP response.
///
/// A body that is not JSON is always a failure whose error carries the
/// status code, its reason phrase and the raw text.
pub fn normalize_response(status: StatusCode, raw_body: &str) -> RequestResult<Value> {
    let body: Value = match serde_json::from_str(raw_body) {
        Ok(body) => body,
        Err(_) => {
            return RequestResult::failure(format!(
                "Invalid JSON response (HTTP {} {}): {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or(""),
                raw_body
            ))
        }
    };

    let message = str_field(&body, "message").map(str::to_string);
    if status.is_success() {
        RequestResult::success(body, message)
    } else {
        RequestResult::failure_with_message(extract_error(status, &body), message)
    }
}

/// Best available human-readable error for a failed response body.
pub fn extract_error(status: StatusCode, body: &Value) -> String {
    ERROR_RULES
        .iter()
        .find_map(|(name, rule)| {
            let found = rule(body);
            if found.is_some() {
                trace!(rule = *name, "Error text extracted");
            }
            found
        })
        .unwrap_or_else(|| {
            format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )
        })
}

/// Failure result for an error raised before any response arrived.
pub fn transport_failure<T>(error: &reqwest::Error) -> RequestResult<T> {
    let message = error.to_string();
    if message.trim().is_empty() {
        RequestResult::failure(NETWORK_ERROR)
    } else {
        RequestResult::failure(message)
    }
}

fn message_field(body: &Value) -> Option<String> {
    text_field(body, "message")
}

fn error_field(body: &Value) -> Option<String> {
    text_field(body, "error")
}

fn detail_field(body: &Value) -> Option<String> {
    text_field(body, "detail")
}

fn errors_field(body: &Value) -> Option<String> {
    text_field(body, "errors")
}

fn string_body(body: &Value) -> Option<String> {
    body.as_str()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn text_field(body: &Value, key: &str) -> Option<String> {
    let value = body.get(key)?;
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) if !items.is_empty() => Some(
            items
                .iter()
                .map(value_to_string)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Object(map) if !map.is_empty() => Some(value_to_string(value)),
        _ => None,
    }
}
