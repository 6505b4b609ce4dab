//! Maps the opaque bearer string a browser sends into the headers ERPNext
//! expects. Every proxy route goes through [`resolve`]; nothing else in the
//! crate builds `Authorization` or `Cookie` headers for the ERP.

use reqwest::RequestBuilder;

/// Prefix of ERPNext API-key credentials (`Token <key>:<secret>`).
pub const API_KEY_PREFIX: &str = "Token ";

/// Which auth scheme an opaque credential is treated as.
///
/// Classification is order-dependent: the `Token ` prefix wins over the colon
/// check, and anything else is a session id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// `Token <key>:<secret>`, forwarded verbatim.
    ApiKey,
    /// Contains `:` without the prefix; sent as a bearer token and left for
    /// the upstream to validate.
    KeyLike,
    /// Short opaque session id; sent as `sid` cookie and as bearer.
    Session,
}

impl CredentialKind {
    pub fn classify(credential: &str) -> Self {
        if credential.starts_with(API_KEY_PREFIX) {
            CredentialKind::ApiKey
        } else if credential.contains(':') {
            CredentialKind::KeyLike
        } else {
            CredentialKind::Session
        }
    }
}

/// Headers attached to every outbound ERP call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderSet {
    pub authorization: String,
    pub cookie: Option<String>,
}

impl HeaderSet {
    pub const CONTENT_TYPE: &'static str = "application/json";

    /// Plain bearer header, used for identity-provider tokens that must not
    /// be mistaken for a session id.
    pub fn bearer(token: &str) -> Self {
        Self {
            authorization: format!("Bearer {}", token),
            cookie: None,
        }
    }

    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("Content-Type", Self::CONTENT_TYPE.to_string()),
            ("Authorization", self.authorization.clone()),
        ];
        if let Some(cookie) = &self.cookie {
            pairs.push(("Cookie", cookie.clone()));
        }
        pairs
    }

    /// Adapter for the reqwest transport.
    pub fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        self.pairs()
            .into_iter()
            .fold(builder, |builder, (name, value)| builder.header(name, value))
    }
}

/// Resolve an opaque credential into upstream headers. Pure; the caller has
/// already rejected a missing credential.
pub fn resolve(credential: &str) -> HeaderSet {
    match CredentialKind::classify(credential) {
        CredentialKind::ApiKey => HeaderSet {
            authorization: credential.to_string(),
            cookie: None,
        },
        CredentialKind::KeyLike => HeaderSet::bearer(credential),
        CredentialKind::Session => HeaderSet {
            authorization: format!("Bearer {}", credential),
            cookie: Some(format!("sid={}", credential)),
        },
    }
}
