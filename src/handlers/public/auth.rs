// handlers/public/auth.rs - credential acquisition
//
// These routes run before the browser holds a usable credential: password
// login against ERPNext, Keycloak token exchange, and Keycloak refresh.

use axum::{extract::rejection::JsonRejection, http::HeaderMap, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::auth::extract_credential;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::upstream::sso::{self, session_cookie};
use crate::upstream::{normalize, ExchangedCredential};

fn required_str(body: &Value, field: &str) -> Option<String> {
    body.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// POST /api/auth/login
///
/// Input: `{ "username": "...", "password": "..." }`
/// Output: `{ "success": true, "data": { "token": "<sid>", "user": "...", "full_name": "..." } }`
pub async fn login(state: AppState, payload: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    let Json(body) = payload?;
    let (Some(username), Some(password)) = (required_str(&body, "username"), required_str(&body, "password")) else {
        return Err(ApiError::bad_request("username and password are required"));
    };

    let response = state
        .erp
        .call_raw(None, "login", &json!({ "usr": username, "pwd": password }))
        .await?;

    if !response.status.is_success() {
        let normalized = normalize(&response.text, "Invalid username or password");
        tracing::warn!("Login for {} rejected with {}", username, response.status.as_u16());
        return Err(ApiError::Upstream {
            status: response.status.as_u16(),
            message: normalized.message,
        });
    }

    let Some(sid) = session_cookie(&response.headers) else {
        tracing::error!("Login for {} returned no session cookie", username);
        return Err(ApiError::BadGateway("Login succeeded but no session was issued".to_string()));
    };

    let full_name = serde_json::from_str::<Value>(&response.text)
        .ok()
        .and_then(|v| v.get("full_name").cloned())
        .unwrap_or(Value::Null);

    Ok(ApiResponse::success(json!({
        "token": sid,
        "user": username,
        "full_name": full_name,
    })))
}

/// POST /api/auth/sso
///
/// The identity-provider token comes from `{ "token": "..." }` or the bearer
/// header. On failure the token is echoed back as `fallback_token`.
pub async fn sso_exchange(
    state: AppState,
    headers: HeaderMap,
    payload: Option<Json<Value>>,
) -> ApiResult<ExchangedCredential> {
    let idp_token = payload
        .as_ref()
        .and_then(|Json(body)| required_str(body, "token"))
        .or_else(|| extract_credential(&headers))
        .ok_or_else(|| ApiError::unauthorized("Identity provider token required"))?;

    let method = format!("{}.auth.exchange_sso_token", state.namespace());
    let credential = sso::exchange(&state.erp, &method, &idp_token).await?;
    Ok(ApiResponse::success(credential))
}

/// POST /api/auth/refresh
///
/// Input: `{ "refresh_token": "..." }`; the Keycloak token response is
/// returned unchanged.
pub async fn refresh(state: AppState, payload: Result<Json<Value>, JsonRejection>) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;
    let Some(refresh_token) = required_str(&body, "refresh_token") else {
        return Err(ApiError::bad_request("refresh_token is required"));
    };
    if !state.sso.is_configured() {
        return Err(ApiError::service_unavailable("SSO is not configured"));
    }

    let tokens = state.sso.refresh(&refresh_token).await?;
    Ok(Json(tokens))
}
