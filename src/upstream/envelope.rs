use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which of ERPNext's two HTTP surfaces produced a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStyle {
    /// `/api/method/...` wraps its payload in `{ "message": ... }`
    Rpc,
    /// `/api/resource/...` wraps its payload in `{ "data": ... }`
    Resource,
}

impl EnvelopeStyle {
    fn key(self) -> &'static str {
        match self {
            EnvelopeStyle::Rpc => "message",
            EnvelopeStyle::Resource => "data",
        }
    }
}

/// Strip exactly one envelope layer. Consumes the envelope so a payload
/// cannot be unwrapped a second time by accident.
pub fn unwrap(style: EnvelopeStyle, envelope: Value) -> Value {
    match envelope {
        Value::Object(mut map) if map.contains_key(style.key()) => {
            map.remove(style.key()).unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// List shape handed to the browser regardless of which upstream stage
/// answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEnvelope {
    pub data: Vec<Value>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

impl ListEnvelope {
    pub fn from_rows(rows: Vec<Value>, limit: u32, offset: u32) -> Self {
        let total = rows.len() as u64;
        Self { data: rows, total, limit, offset }
    }

    /// Reshape an unwrapped RPC list payload. Custom list methods return
    /// either a bare array or `{ data, total }`.
    pub fn from_payload(payload: Value, limit: u32, offset: u32) -> Self {
        match payload {
            Value::Array(rows) => Self::from_rows(rows, limit, offset),
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(rows)) => {
                    let reported = map
                        .get("total")
                        .or_else(|| map.get("total_count"))
                        .and_then(Value::as_u64);
                    let mut envelope = Self::from_rows(rows, limit, offset);
                    if let Some(total) = reported {
                        envelope.total = total;
                    }
                    envelope
                }
                Some(other) => Self::from_rows(vec![other], limit, offset),
                None => Self::from_rows(vec![Value::Object(map)], limit, offset),
            },
            Value::Null => Self::from_rows(vec![], limit, offset),
            other => Self::from_rows(vec![other], limit, offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rpc_unwraps_message_once() {
        let env = json!({"message": {"message": "inner"}});
        assert_eq!(unwrap(EnvelopeStyle::Rpc, env), json!({"message": "inner"}));
    }

    #[test]
    fn missing_key_returns_whole_envelope() {
        let env = json!({"name": "T-0001"});
        assert_eq!(unwrap(EnvelopeStyle::Rpc, env.clone()), env);
        assert_eq!(unwrap(EnvelopeStyle::Resource, env.clone()), env);
    }

    #[test]
    fn resource_unwraps_data() {
        let env = json!({"data": [{"name": "a"}]});
        assert_eq!(unwrap(EnvelopeStyle::Resource, env), json!([{"name": "a"}]));
    }

    #[test]
    fn list_payload_shapes() {
        let bare = ListEnvelope::from_payload(json!([1, 2, 3]), 20, 0);
        assert_eq!(bare.total, 3);

        let counted = ListEnvelope::from_payload(json!({"data": [1], "total": 42}), 1, 5);
        assert_eq!(counted.data, vec![json!(1)]);
        assert_eq!(counted.total, 42);
        assert_eq!(counted.offset, 5);

        let empty = ListEnvelope::from_payload(Value::Null, 20, 0);
        assert!(empty.data.is_empty());
        assert_eq!(empty.total, 0);
    }
}
