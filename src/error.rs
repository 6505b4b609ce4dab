// HTTP API Error Types
use axum::{extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::filter::FilterError;
use crate::upstream::{ExchangeFailure, UpstreamError};

/// HTTP API error with appropriate status codes and client-friendly messages.
/// Every variant serializes to `{ "message": ... }`.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized(String),

    // Upstream answered non-2xx; status is passed through
    Upstream { status: u16, message: String },

    // SSO exchange failed; the IdP token is returned for direct use
    SsoExchange { status: u16, message: String, fallback_token: String },

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (unreadable upstream response)
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Upstream { status, .. } => *status,
            ApiError::SsoExchange { status, .. } => *status,
            ApiError::InternalServerError(_) => 500,
            ApiError::BadGateway(_) => 502,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::InvalidJson(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Upstream { message, .. } => message,
            ApiError::SsoExchange { message, .. } => message,
            ApiError::InternalServerError(msg) => msg,
            ApiError::BadGateway(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::SsoExchange { message, fallback_token, .. } => json!({
                "message": message,
                "fallback_token": fallback_token
            }),
            _ => json!({ "message": self.message() }),
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Status { status, message } => ApiError::Upstream { status, message },
            UpstreamError::Transport(e) => {
                tracing::error!("Upstream transport error: {}", e);
                ApiError::internal_server_error(e.to_string())
            }
            UpstreamError::Decode(e) => {
                tracing::error!("Upstream response decode error: {}", e);
                ApiError::BadGateway("Upstream returned an unreadable response".to_string())
            }
            UpstreamError::Url(msg) => {
                tracing::error!("Upstream configuration error: {}", msg);
                ApiError::internal_server_error(msg)
            }
        }
    }
}

impl From<ExchangeFailure> for ApiError {
    fn from(failure: ExchangeFailure) -> Self {
        ApiError::SsoExchange {
            status: failure.status,
            message: failure.message,
            fallback_token: failure.idp_token,
        }
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_json(rejection.body_text())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
        (status, Json(self.to_json())).into_response()
    }
}
