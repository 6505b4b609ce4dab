use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

use crate::error::ApiError;
use crate::upstream::{resolve, CredentialKind, HeaderSet};

/// Opaque credential taken from the inbound `Authorization` header.
///
/// Extracting it rejects the request with 401 before any upstream call is
/// made, so handlers that take a `Credential` never see a missing one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential(pub String);

impl Credential {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> CredentialKind {
        CredentialKind::classify(&self.0)
    }

    pub fn headers(&self) -> HeaderSet {
        resolve(&self.0)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Credential
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        extract_credential(&parts.headers)
            .map(Credential)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Value after an optional `Bearer` scheme (any case). The browser sends API
/// keys as `Bearer Token <key>:<secret>`; a bare `Token ...` header is
/// accepted too.
pub fn extract_credential(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get("authorization")?.to_str().ok()?.trim();
    let value = strip_bearer(raw).trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn strip_bearer(raw: &str) -> &str {
    match raw.get(..6) {
        Some(scheme)
            if scheme.eq_ignore_ascii_case("bearer")
                && raw[6..].chars().next().map_or(true, char::is_whitespace) =>
        {
            &raw[6..]
        }
        _ => raw,
    }
}
