use serde_json::{json, Map, Value};

use super::error::FilterError;
use super::types::{Filters, ListQuery, PageDefaults};

/// Validated list parameters, translatable into each upstream surface's
/// conventions.
#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub fields: Option<Vec<String>>,
    pub filters: Option<Filters>,
    pub limit: u32,
    pub offset: u32,
}

impl ListParams {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            fields: None,
            filters: None,
            limit,
            offset,
        }
    }

    pub fn from_query(query: &ListQuery, defaults: PageDefaults) -> Result<Self, FilterError> {
        let fields = query.fields.as_deref().map(parse_fields).transpose()?;
        let filters = query.filters.as_deref().map(parse_filters).transpose()?.flatten();

        let limit = parse_number(query.limit.as_deref(), "limit")?;
        let offset = parse_number(query.offset.as_deref(), "offset")?;
        let page = parse_number(query.page.as_deref(), "page")?;
        let page_length = parse_number(query.page_length.as_deref(), "page_length")?;

        let requested = limit.or(page_length).unwrap_or(defaults.default_limit);
        // Frappe reads a page length of 0 as "no limit"
        if requested == 0 {
            return Err(FilterError::InvalidLimit("limit must be at least 1".to_string()));
        }
        let limit = if requested > defaults.max_limit {
            tracing::warn!("Limit {} exceeds max {}, capping to max", requested, defaults.max_limit);
            defaults.max_limit
        } else {
            requested
        };

        let offset = match (offset, page) {
            (Some(offset), _) => offset,
            (None, Some(page)) => page.saturating_sub(1).saturating_mul(limit),
            (None, None) => 0,
        };

        Ok(Self {
            fields,
            filters,
            limit,
            offset,
        })
    }

    /// Query pairs for the GET stage of an RPC list method.
    pub fn rpc_query(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(fields) = &self.fields {
            pairs.push(("fields".to_string(), json!(fields).to_string()));
        }
        if let Some(filters) = &self.filters {
            pairs.push(("filters".to_string(), filters.to_query_value()));
        }
        pairs.push(("limit".to_string(), self.limit.to_string()));
        pairs.push(("offset".to_string(), self.offset.to_string()));
        pairs
    }

    /// JSON body for the POST stage of an RPC list method.
    pub fn rpc_body(&self) -> Value {
        let mut body = Map::new();
        if let Some(fields) = &self.fields {
            body.insert("fields".into(), json!(fields));
        }
        if let Some(filters) = &self.filters {
            body.insert("filters".into(), filters.to_body_value());
        }
        body.insert("limit".into(), json!(self.limit));
        body.insert("offset".into(), json!(self.offset));
        Value::Object(body)
    }

    /// Query pairs for `/api/resource/<DocType>`. Without explicit fields the
    /// resource API returns only `name`, so all fields are requested.
    pub fn resource_query(&self) -> Vec<(String, String)> {
        let fields = match &self.fields {
            Some(fields) => json!(fields).to_string(),
            None => json!(["*"]).to_string(),
        };
        let mut pairs = vec![("fields".to_string(), fields)];
        if let Some(filters) = &self.filters {
            pairs.push(("filters".to_string(), filters.to_query_value()));
        }
        pairs.push(("limit_page_length".to_string(), self.limit.to_string()));
        pairs.push(("limit_start".to_string(), self.offset.to_string()));
        pairs
    }
}

fn parse_fields(raw: &str) -> Result<Vec<String>, FilterError> {
    serde_json::from_str::<Vec<String>>(raw)
        .map_err(|_| FilterError::InvalidFields("fields must be a JSON array of field names".to_string()))
}

fn parse_filters(raw: &str) -> Result<Option<Filters>, FilterError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let value = match serde_json::from_str::<Value>(raw) {
        Ok(value) => value,
        Err(_) => return Ok(Some(Filters::Raw(raw.to_string()))),
    };
    match &value {
        Value::Array(conditions) => {
            for condition in conditions {
                let valid = condition
                    .as_array()
                    .map(|parts| parts.len() == 3 || parts.len() == 4)
                    .unwrap_or(false);
                if !valid {
                    return Err(FilterError::InvalidFilters(format!(
                        "expected [field, operator, value], got {}",
                        condition
                    )));
                }
            }
            Ok(Some(Filters::Structured(value)))
        }
        Value::Object(_) => Ok(Some(Filters::Structured(value))),
        // A JSON string literal is a filter the caller serialized twice
        Value::String(inner) => Ok(Some(Filters::Raw(inner.clone()))),
        other => Err(FilterError::InvalidFilters(format!("unsupported filter value {}", other))),
    }
}

fn parse_number(raw: Option<&str>, name: &str) -> Result<Option<u32>, FilterError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(text) => text.parse::<u32>().map(Some).map_err(|_| match name {
            "offset" | "page" => FilterError::InvalidOffset(format!("{} must be a non-negative integer", name)),
            _ => FilterError::InvalidLimit(format!("{} must be a non-negative integer", name)),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> ListQuery {
        let mut q = ListQuery::default();
        for (k, v) in pairs {
            let v = Some(v.to_string());
            match *k {
                "fields" => q.fields = v,
                "filters" => q.filters = v,
                "limit" => q.limit = v,
                "offset" => q.offset = v,
                "page" => q.page = v,
                "page_length" => q.page_length = v,
                _ => unreachable!(),
            }
        }
        q
    }

    #[test]
    fn defaults_apply() {
        let params = ListParams::from_query(&ListQuery::default(), PageDefaults::default()).unwrap();
        assert_eq!(params, ListParams::new(20, 0));
    }

    #[test]
    fn page_translates_to_offset() {
        let q = query(&[("page", "3"), ("page_length", "25")]);
        let params = ListParams::from_query(&q, PageDefaults::default()).unwrap();
        assert_eq!(params.limit, 25);
        assert_eq!(params.offset, 50);
    }

    #[test]
    fn explicit_offset_wins_over_page() {
        let q = query(&[("page", "3"), ("limit", "10"), ("offset", "7")]);
        let params = ListParams::from_query(&q, PageDefaults::default()).unwrap();
        assert_eq!((params.limit, params.offset), (10, 7));
    }

    #[test]
    fn limit_is_capped() {
        let q = query(&[("limit", "5000")]);
        let defaults = PageDefaults { default_limit: 20, max_limit: 100 };
        assert_eq!(ListParams::from_query(&q, defaults).unwrap().limit, 100);
    }

    #[test]
    fn zero_limit_is_rejected() {
        let defaults = PageDefaults { default_limit: 20, max_limit: 100 };
        for key in ["limit", "page_length"] {
            assert!(matches!(
                ListParams::from_query(&query(&[(key, "0")]), defaults),
                Err(FilterError::InvalidLimit(_))
            ));
        }
    }

    #[test]
    fn bad_numbers_and_fields_are_rejected() {
        assert!(matches!(
            ListParams::from_query(&query(&[("limit", "-1")]), PageDefaults::default()),
            Err(FilterError::InvalidLimit(_))
        ));
        assert!(matches!(
            ListParams::from_query(&query(&[("fields", "name,owner")]), PageDefaults::default()),
            Err(FilterError::InvalidFields(_))
        ));
        assert!(matches!(
            ListParams::from_query(&query(&[("filters", "[[\"a\", \"=\"]]")]), PageDefaults::default()),
            Err(FilterError::InvalidFilters(_))
        ));
    }

    #[test]
    fn resource_translation() {
        let q = query(&[
            ("fields", r#"["name","tenant_name"]"#),
            ("filters", r#"[["status","=","Active"]]"#),
            ("limit", "10"),
            ("offset", "30"),
        ]);
        let params = ListParams::from_query(&q, PageDefaults::default()).unwrap();
        assert_eq!(
            params.resource_query(),
            vec![
                ("fields".to_string(), r#"["name","tenant_name"]"#.to_string()),
                ("filters".to_string(), r#"[["status","=","Active"]]"#.to_string()),
                ("limit_page_length".to_string(), "10".to_string()),
                ("limit_start".to_string(), "30".to_string()),
            ]
        );
        assert_eq!(
            params.rpc_body(),
            json!({
                "fields": ["name", "tenant_name"],
                "filters": [["status", "=", "Active"]],
                "limit": 10,
                "offset": 30
            })
        );
    }

    #[test]
    fn raw_filters_pass_through() {
        let q = query(&[("filters", "status=Active")]);
        let params = ListParams::from_query(&q, PageDefaults::default()).unwrap();
        assert_eq!(params.filters, Some(Filters::Raw("status=Active".to_string())));
        assert!(params.resource_query().contains(&("fields".to_string(), r#"["*"]"#.to_string())));
    }
}
