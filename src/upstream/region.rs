use serde_json::{Map, Value};

pub const DEFAULT_REGION: &str = "AS923";

/// ERPNext validates the LoRaWAN region against option lists that end in a
/// newline, so the code must always carry exactly that trailing `\n`.
pub fn normalize_region(region: Option<&str>, default_region: &str) -> String {
    let code = match region {
        Some(r) if !r.trim().is_empty() => r,
        _ => default_region,
    };
    if code.ends_with('\n') {
        code.to_string()
    } else {
        format!("{}\n", code)
    }
}

/// Rewrite `field` in an outbound document. With `fill_default` an absent
/// field is set to the default region; otherwise it is left absent.
pub fn apply_region(body: &mut Map<String, Value>, field: &str, default_region: &str, fill_default: bool) {
    let current = match body.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    };
    if current.is_none() && !fill_default {
        return;
    }
    let normalized = normalize_region(current.as_deref(), default_region);
    body.insert(field.to_string(), Value::String(normalized));
}
