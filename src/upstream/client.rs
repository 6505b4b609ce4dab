//! Request forwarder for the ERPNext HTTP API.
//!
//! Two surfaces are spoken: RPC (`/api/method/<dotted.name>`, parameters in a
//! POST body even for reads) and resource (`/api/resource/<DocType>[/<name>]`,
//! CRUD with query-string list parameters). Calls within one operation run
//! sequentially; the only extra attempts are the list fallback and the single
//! delayed enrichment re-fetch.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use super::credential::HeaderSet;
use super::envelope::{self, EnvelopeStyle, ListEnvelope};
use super::error::UpstreamError;
use super::normalize::normalize;
use crate::filter::ListParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    Method(&'a str),
    Resource { doctype: &'a str, name: Option<&'a str> },
}

impl Endpoint<'_> {
    pub fn style(&self) -> EnvelopeStyle {
        match self {
            Endpoint::Method(_) => EnvelopeStyle::Rpc,
            Endpoint::Resource { .. } => EnvelopeStyle::Resource,
        }
    }
}

/// Order in which a list operation tries the upstream surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStrategy {
    /// RPC GET, then RPC POST, then resource
    Cascade,
    /// RPC POST, then resource
    RpcWithFallback,
    /// Resource only
    Resource,
}

impl ListStrategy {
    fn rpc_attempts(self) -> &'static [Method] {
        match self {
            ListStrategy::Cascade => &[Method::GET, Method::POST],
            ListStrategy::RpcWithFallback => &[Method::POST],
            ListStrategy::Resource => &[],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ListSource<'a> {
    pub method: &'a str,
    pub doctype: &'a str,
    pub strategy: ListStrategy,
    pub fallback_message: &'a str,
}

/// A field an upstream post-insert hook fills in after the create call has
/// already returned.
#[derive(Debug, Clone, Copy)]
pub struct Enrichment<'a> {
    pub derived_field: &'a str,
    pub lookup_key: &'a str,
    pub fetch_method: &'a str,
}

/// Body and headers of an RPC call, for callers that need cookies.
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct ErpClient {
    http: reqwest::Client,
    base_url: Url,
    enrichment_delay: Duration,
}

impl ErpClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Result<Self, UpstreamError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| UpstreamError::Url(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(UpstreamError::Url(format!("{} cannot be used as a base URL", base_url)));
        }
        Ok(Self {
            http,
            base_url,
            enrichment_delay: Duration::from_secs(1),
        })
    }

    pub fn with_enrichment_delay(mut self, delay: Duration) -> Self {
        self.enrichment_delay = delay;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn url(&self, endpoint: &Endpoint<'_>) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in new()
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("api");
            match endpoint {
                Endpoint::Method(name) => {
                    segments.push("method").push(name);
                }
                Endpoint::Resource { doctype, name } => {
                    segments.push("resource").push(doctype);
                    if let Some(name) = name {
                        segments.push(name);
                    }
                }
            }
        }
        url
    }

    /// Send one request and unwrap its envelope. Non-2xx bodies go through
    /// the normalizer and keep the upstream status.
    pub async fn send(
        &self,
        method: Method,
        endpoint: Endpoint<'_>,
        headers: &HeaderSet,
        query: &[(String, String)],
        body: Option<&Value>,
        fallback_message: &str,
    ) -> Result<Value, UpstreamError> {
        let url = self.url(&endpoint);
        debug!("ERP {} {}", method, url);

        let mut request = headers.apply(self.http.request(method.clone(), url.clone()));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!("ERP {} {} failed: {}", method, url, e);
            UpstreamError::Transport(e)
        })?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let normalized = normalize(&text, fallback_message);
            warn!("ERP {} {} returned {}: {}", method, url.path(), status.as_u16(), normalized.message);
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message: normalized.message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        let envelope: Value = serde_json::from_str(&text)?;
        Ok(envelope::unwrap(endpoint.style(), envelope))
    }

    /// RPC call with parameters in the POST body.
    pub async fn call(
        &self,
        headers: &HeaderSet,
        method: &str,
        body: &Value,
        fallback_message: &str,
    ) -> Result<Value, UpstreamError> {
        self.send(Method::POST, Endpoint::Method(method), headers, &[], Some(body), fallback_message)
            .await
    }

    /// RPC call for the few methods that only answer GET.
    pub async fn call_get(
        &self,
        headers: &HeaderSet,
        method: &str,
        query: &[(String, String)],
        fallback_message: &str,
    ) -> Result<Value, UpstreamError> {
        self.send(Method::GET, Endpoint::Method(method), headers, query, None, fallback_message)
            .await
    }

    /// RPC POST without envelope handling; status and cookies are left to
    /// the caller. `headers` is `None` for calls made before the user has a
    /// credential (login).
    pub async fn call_raw(
        &self,
        headers: Option<&HeaderSet>,
        method: &str,
        body: &Value,
    ) -> Result<RawResponse, UpstreamError> {
        let url = self.url(&Endpoint::Method(method));
        debug!("ERP POST {}", url);
        let mut request = self.http.post(url);
        if let Some(headers) = headers {
            request = headers.apply(request);
        }
        let response = request.json(body).send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await?;
        Ok(RawResponse { status, headers, text })
    }

    /// Guest `ping` method; used for health checks.
    pub async fn ping(&self) -> Result<Value, UpstreamError> {
        let url = self.url(&Endpoint::Method("ping"));
        let response = self.http.get(url).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message: normalize(&text, "ERP ping failed").message,
            });
        }
        Ok(envelope::unwrap(EnvelopeStyle::Rpc, serde_json::from_str(&text)?))
    }

    /// Open a GET whose body the caller will stream.
    pub async fn open_stream(
        &self,
        headers: &HeaderSet,
        method: &str,
        query: &[(String, String)],
        fallback_message: &str,
    ) -> Result<reqwest::Response, UpstreamError> {
        let url = self.url(&Endpoint::Method(method));
        debug!("ERP stream {}", url);
        let response = headers
            .apply(self.http.get(url))
            .header("Accept", "text/event-stream")
            .query(query)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let normalized = normalize(&text, fallback_message);
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message: normalized.message,
            });
        }
        Ok(response)
    }

    pub async fn get_doc(
        &self,
        headers: &HeaderSet,
        doctype: &str,
        name: &str,
        fallback_message: &str,
    ) -> Result<Value, UpstreamError> {
        let endpoint = Endpoint::Resource { doctype, name: Some(name) };
        self.send(Method::GET, endpoint, headers, &[], None, fallback_message).await
    }

    pub async fn list_docs(
        &self,
        headers: &HeaderSet,
        doctype: &str,
        params: &ListParams,
        fallback_message: &str,
    ) -> Result<Vec<Value>, UpstreamError> {
        let endpoint = Endpoint::Resource { doctype, name: None };
        let rows = self
            .send(Method::GET, endpoint, headers, &params.resource_query(), None, fallback_message)
            .await?;
        Ok(match rows {
            Value::Array(rows) => rows,
            Value::Null => vec![],
            other => vec![other],
        })
    }

    pub async fn insert_doc(
        &self,
        headers: &HeaderSet,
        doctype: &str,
        doc: &Value,
        fallback_message: &str,
    ) -> Result<Value, UpstreamError> {
        let endpoint = Endpoint::Resource { doctype, name: None };
        let body = json!({ "data": doc });
        self.send(Method::POST, endpoint, headers, &[], Some(&body), fallback_message).await
    }

    pub async fn update_doc(
        &self,
        headers: &HeaderSet,
        doctype: &str,
        name: &str,
        doc: &Value,
        fallback_message: &str,
    ) -> Result<Value, UpstreamError> {
        let endpoint = Endpoint::Resource { doctype, name: Some(name) };
        let body = json!({ "data": doc });
        self.send(Method::PUT, endpoint, headers, &[], Some(&body), fallback_message).await
    }

    pub async fn delete_doc(
        &self,
        headers: &HeaderSet,
        doctype: &str,
        name: &str,
        fallback_message: &str,
    ) -> Result<Value, UpstreamError> {
        let endpoint = Endpoint::Resource { doctype, name: Some(name) };
        self.send(Method::DELETE, endpoint, headers, &[], None, fallback_message).await
    }

    /// List through the RPC method, falling back to the resource API when
    /// the method answers non-2xx or a 2xx body that is not JSON. Transport
    /// failures are not retried.
    pub async fn list(
        &self,
        headers: &HeaderSet,
        source: &ListSource<'_>,
        params: &ListParams,
    ) -> Result<ListEnvelope, UpstreamError> {
        for verb in source.strategy.rpc_attempts() {
            let attempt = if *verb == Method::GET {
                self.call_get(headers, source.method, &params.rpc_query(), source.fallback_message)
                    .await
            } else {
                self.call(headers, source.method, &params.rpc_body(), source.fallback_message)
                    .await
            };
            match attempt {
                Ok(payload) => return Ok(ListEnvelope::from_payload(payload, params.limit, params.offset)),
                Err(UpstreamError::Status { status, message }) => {
                    info!(
                        "{} {} answered {} ({}); trying next list stage",
                        verb, source.method, status, message
                    );
                }
                Err(UpstreamError::Decode(e)) => {
                    info!(
                        "{} {} answered 2xx with an unreadable body ({}); trying next list stage",
                        verb, source.method, e
                    );
                }
                Err(e) => return Err(e),
            }
        }

        let rows = self
            .list_docs(headers, source.doctype, params, source.fallback_message)
            .await?;
        Ok(ListEnvelope::from_rows(rows, params.limit, params.offset))
    }

    /// Fill in a field that an upstream hook populates asynchronously. At
    /// most one re-fetch happens, after `enrichment_delay`; any failure leaves
    /// the record as it was.
    pub async fn enrich(&self, headers: &HeaderSet, record: Value, enrichment: &Enrichment<'_>) -> Value {
        let Value::Object(mut doc) = record else {
            return record;
        };
        if has_value(doc.get(enrichment.derived_field)) {
            return Value::Object(doc);
        }
        let Some(key) = doc.get(enrichment.lookup_key).and_then(Value::as_str).map(str::to_owned) else {
            return Value::Object(doc);
        };

        debug!(
            "{} missing on {}; re-fetching in {:?}",
            enrichment.derived_field, key, self.enrichment_delay
        );
        tokio::time::sleep(self.enrichment_delay).await;

        match self
            .call(headers, enrichment.fetch_method, &json!({ "id": key }), "Re-fetch failed")
            .await
        {
            Ok(fresh) => match fresh.get(enrichment.derived_field) {
                Some(value) if has_value(Some(value)) => {
                    info!("{} for {} populated after re-fetch", enrichment.derived_field, key);
                    doc.insert(enrichment.derived_field.to_string(), value.clone());
                }
                _ => debug!("{} for {} still absent", enrichment.derived_field, key),
            },
            Err(e) => warn!("Re-fetch of {} for {} failed: {}", enrichment.derived_field, key, e),
        }

        Value::Object(doc)
    }
}

fn has_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}
