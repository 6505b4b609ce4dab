// handlers/protected/auth.rs - session endpoints for an authenticated caller

use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, Credential};
use crate::state::AppState;

/// GET /api/auth/whoami
pub async fn whoami(state: AppState, credential: Credential) -> ApiResult<Value> {
    let user = state
        .erp
        .call_get(
            &credential.headers(),
            "frappe.auth.get_logged_user",
            &[],
            "Failed to resolve current user",
        )
        .await?;

    Ok(ApiResponse::success(json!({ "user": user })))
}

/// POST /api/auth/logout
pub async fn logout(state: AppState, credential: Credential) -> ApiResult<Value> {
    state
        .erp
        .call(&credential.headers(), "logout", &json!({}), "Failed to log out")
        .await?;

    Ok(ApiResponse::success(json!({ "logged_out": true })))
}
