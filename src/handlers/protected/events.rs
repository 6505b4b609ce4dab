use axum::{
    body::Body,
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE},
        HeaderValue,
    },
    response::Response,
};
use futures::{future, StreamExt};

use crate::entities::Entity;
use crate::error::ApiError;
use crate::middleware::Credential;
use crate::state::AppState;
use crate::types::RpcMethod;

/// GET /api/<entity>/:id/events - relay the upstream event stream.
///
/// Bytes are forwarded as they arrive without being interpreted. A read error
/// ends the relay quietly; it usually means one side went away.
pub async fn stream(entity: &'static Entity, state: AppState, credential: Credential, id: String) -> Result<Response, ApiError> {
    let method = entity.method(state.namespace(), RpcMethod::StreamEvents);
    let failure = format!("Failed to open {} event stream", entity.label);
    let upstream = state
        .erp
        .open_stream(&credential.headers(), &method, &[("id".to_string(), id.clone())], &failure)
        .await?;

    let content_type = upstream
        .headers()
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("text/event-stream"));

    tracing::info!("Relaying {} events for {}", entity.label, id);
    let relay = upstream.bytes_stream().take_while(move |chunk| {
        if let Err(e) = chunk {
            tracing::debug!("{} event stream for {} closed: {}", entity.label, id, e);
        }
        future::ready(chunk.is_ok())
    });

    Response::builder()
        .header(CONTENT_TYPE, content_type)
        .header(CACHE_CONTROL, "no-cache")
        .header("x-accel-buffering", "no")
        .body(Body::from_stream(relay))
        .map_err(|e| ApiError::internal_server_error(e.to_string()))
}
