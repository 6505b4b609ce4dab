//! Keycloak-side auth: exchanging an identity-provider token for an ERPNext
//! credential, and refreshing Keycloak tokens.

use reqwest::header::{HeaderMap, SET_COOKIE};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::client::ErpClient;
use super::credential::HeaderSet;
use super::error::UpstreamError;
use super::normalize::normalize;

/// Where the exchanged credential was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    Token,
    SessionId,
    Cookie,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExchangedCredential {
    pub token: String,
    pub source: CredentialSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<String>,
}

/// Exchange failed; the IdP token rides along so the caller can still try
/// it directly against the ERP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeFailure {
    pub status: u16,
    pub message: String,
    pub idp_token: String,
}

/// Value of the `sid` cookie in a response's `Set-Cookie` headers. ERPNext
/// clears sessions with `sid=Guest`, which does not count.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == "sid" && !value.is_empty() && *value != "Guest")
        .map(|(_, value)| value.to_string())
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Look for a credential in priority order: `message.token` (with its key and
/// secret), `message.sid`, then the `sid` cookie.
pub fn extract_credential(body: &Value, headers: &HeaderMap) -> Option<ExchangedCredential> {
    let message = body.get("message");

    if let Some(token) = non_empty_str(message.and_then(|m| m.get("token"))) {
        return Some(ExchangedCredential {
            token,
            source: CredentialSource::Token,
            api_key: non_empty_str(message.and_then(|m| m.get("api_key"))),
            api_secret: non_empty_str(message.and_then(|m| m.get("api_secret"))),
        });
    }

    if let Some(sid) = non_empty_str(message.and_then(|m| m.get("sid"))) {
        return Some(ExchangedCredential {
            token: sid,
            source: CredentialSource::SessionId,
            api_key: None,
            api_secret: None,
        });
    }

    session_cookie(headers).map(|sid| ExchangedCredential {
        token: sid,
        source: CredentialSource::Cookie,
        api_key: None,
        api_secret: None,
    })
}

/// Call the ERP exchange method with an IdP bearer token. No caching; every
/// call hits the upstream.
pub async fn exchange(erp: &ErpClient, method: &str, idp_token: &str) -> Result<ExchangedCredential, ExchangeFailure> {
    let failure = |status: u16, message: String| ExchangeFailure {
        status,
        message,
        idp_token: idp_token.to_string(),
    };

    let response = erp
        .call_raw(Some(&HeaderSet::bearer(idp_token)), method, &json!({ "token": idp_token }))
        .await
        .map_err(|e| {
            tracing::error!("SSO exchange transport failure: {}", e);
            failure(500, e.to_string())
        })?;

    if !response.status.is_success() {
        let normalized = normalize(&response.text, "SSO token exchange failed");
        warn!("SSO exchange returned {}: {}", response.status.as_u16(), normalized.message);
        return Err(failure(response.status.as_u16(), normalized.message));
    }

    let body = serde_json::from_str::<Value>(&response.text).unwrap_or(Value::Null);
    match extract_credential(&body, &response.headers) {
        Some(credential) => {
            debug!("SSO exchange produced a {:?} credential", credential.source);
            Ok(credential)
        }
        None => {
            warn!("SSO exchange succeeded without returning a credential");
            Err(failure(502, "SSO token exchange returned no credential".to_string()))
        }
    }
}

/// Keycloak OAuth2 token endpoint client.
#[derive(Debug, Clone)]
pub struct SsoClient {
    http: reqwest::Client,
    token_url: Option<String>,
    client_id: String,
    client_secret: Option<String>,
}

impl SsoClient {
    pub fn new(
        http: reqwest::Client,
        token_url: Option<String>,
        client_id: impl Into<String>,
        client_secret: Option<String>,
    ) -> Self {
        Self {
            http,
            token_url,
            client_id: client_id.into(),
            client_secret,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.token_url.is_some()
    }

    /// `grant_type=refresh_token`; the token response is returned as-is.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Value, UpstreamError> {
        let Some(token_url) = &self.token_url else {
            return Err(UpstreamError::Url("SSO token endpoint is not configured".to_string()));
        };

        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
        ];
        if let Some(secret) = &self.client_secret {
            form.push(("client_secret", secret.as_str()));
        }

        let response = self.http.post(token_url).form(&form).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            // OAuth errors carry their text in error_description
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| non_empty_str(v.get("error_description")))
                .unwrap_or_else(|| normalize(&text, "Token refresh failed").message);
            warn!("Token refresh returned {}: {}", status.as_u16(), message);
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}
