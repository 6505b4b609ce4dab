//! Collapses ERPNext's error envelopes into a single printable message.
//!
//! Rule order matters because one payload can satisfy several rules:
//! `success:false` → `_server_messages` → `exception` → `exc_message` →
//! `message` → caller fallback. Nested parse failures fall through to the
//! next rule; the function never fails.

use serde::Serialize;
use serde_json::{Map, Value};

/// Longest raw text body echoed back before truncation.
pub const MAX_TEXT_CHARS: usize = 200;
pub const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedError {
    pub message: String,
}

pub fn normalize(raw: &str, fallback: &str) -> NormalizedError {
    let message = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(envelope)) => from_envelope(&envelope),
        Ok(Value::String(text)) => readable_text(&text),
        Ok(_) => None,
        Err(_) => readable_text(raw),
    };

    NormalizedError {
        message: message.unwrap_or_else(|| fallback.to_string()),
    }
}

fn from_envelope(envelope: &Map<String, Value>) -> Option<String> {
    if envelope.get("success") == Some(&Value::Bool(false)) {
        let explicit = envelope
            .get("error")
            .and_then(text_of)
            .or_else(|| envelope.get("message").and_then(text_of));
        if explicit.is_some() {
            return explicit;
        }
    }

    if let Some(message) = envelope.get("_server_messages").and_then(first_server_message) {
        return Some(message);
    }

    if let Some(exception) = envelope.get("exception").and_then(Value::as_str) {
        if !exception.trim().is_empty() {
            return Some(strip_exception_type(exception));
        }
    }

    if let Some(message) = envelope.get("exc_message").and_then(text_of) {
        return Some(message);
    }

    envelope.get("message").and_then(text_of)
}

/// `_server_messages` is a JSON-encoded array whose elements are either
/// objects or JSON-encoded objects.
fn first_server_message(value: &Value) -> Option<String> {
    let messages = match value {
        Value::String(encoded) => serde_json::from_str::<Value>(encoded).ok()?,
        other => other.clone(),
    };

    match messages.as_array()?.first()? {
        Value::Object(entry) => entry.get("message").and_then(text_of),
        Value::String(entry) => match serde_json::from_str::<Value>(entry) {
            Ok(Value::Object(decoded)) => decoded.get("message").and_then(text_of),
            _ => non_blank(entry),
        },
        _ => None,
    }
}

/// `"frappe.exceptions.ValidationError: oops"` → `"oops"`.
fn strip_exception_type(exception: &str) -> String {
    match exception.split_once(':') {
        Some((_, rest)) if !rest.trim().is_empty() => rest.trim().to_string(),
        _ => exception.to_string(),
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => non_blank(s),
        Value::Object(obj) => obj
            .get("exc_message")
            .and_then(text_of)
            .or_else(|| obj.get("message").and_then(text_of))
            .or_else(|| Some(value.to_string())),
        other => Some(other.to_string()),
    }
}

fn non_blank(s: &str) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Raw non-JSON bodies are echoed when they read as text; HTML error pages
/// are not.
fn readable_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('<') {
        return None;
    }
    Some(truncate(raw))
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_TEXT_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(MAX_TEXT_CHARS).collect();
    cut.push_str(ELLIPSIS);
    cut
}
