use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Query string accepted by every list route. Numbers arrive as text so bad
/// input can be reported in the normal error envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListQuery {
    pub fields: Option<String>,
    pub filters: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub page: Option<String>,
    pub page_length: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filters {
    /// Parsed JSON: list of `[field, op, value]` triples or a field map
    Structured(Value),
    /// Text the caller already serialized; forwarded verbatim
    Raw(String),
}

impl Filters {
    pub fn to_query_value(&self) -> String {
        match self {
            Filters::Structured(value) => value.to_string(),
            Filters::Raw(text) => text.clone(),
        }
    }

    pub fn to_body_value(&self) -> Value {
        match self {
            Filters::Structured(value) => value.clone(),
            Filters::Raw(text) => Value::String(text.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PageDefaults {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PageDefaults {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 1000,
        }
    }
}
