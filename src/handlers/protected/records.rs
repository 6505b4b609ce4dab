// handlers/protected/records.rs - CRUD for every catalog entity
//
// One set of handlers serves tenants, applications, devices, gateways,
// device profiles, subscriptions and users. The entity descriptor decides
// which ERPNext surface each operation uses.

use axum::{extract::rejection::JsonRejection, Json};
use serde_json::{json, Map, Value};

use crate::entities::{Entity, Surface};
use crate::error::ApiError;
use crate::filter::{ListParams, ListQuery};
use crate::middleware::{ApiResponse, ApiResult, Credential};
use crate::state::AppState;
use crate::types::{Operation, RpcMethod};
use crate::upstream::region::apply_region;
use crate::upstream::{ListEnvelope, ListSource};

/// GET /api/<entity>
pub async fn list(
    entity: &'static Entity,
    state: AppState,
    credential: Credential,
    query: ListQuery,
) -> Result<Json<ListEnvelope>, ApiError> {
    let params = ListParams::from_query(&query, state.page_defaults())?;
    let method = entity.method(state.namespace(), RpcMethod::List);
    let failure = entity.failure(Operation::List);
    let source = ListSource {
        method: &method,
        doctype: entity.doctype,
        strategy: entity.list,
        fallback_message: &failure,
    };

    let envelope = state.erp.list(&credential.headers(), &source, &params).await?;
    Ok(Json(envelope))
}

/// GET /api/<entity>/:id
///
/// RPC fetches send the id in a POST body; the upstream methods only read
/// parameters from there.
pub async fn show(entity: &'static Entity, state: AppState, credential: Credential, id: String) -> ApiResult<Value> {
    let headers = credential.headers();
    let failure = entity.failure(Operation::Fetch);

    let record = match entity.fetch {
        Surface::Rpc => {
            let method = entity.method(state.namespace(), RpcMethod::Get);
            state.erp.call(&headers, &method, &json!({ "id": id }), &failure).await?
        }
        Surface::Resource => state.erp.get_doc(&headers, entity.doctype, &id, &failure).await?,
    };

    Ok(ApiResponse::success(record))
}

/// POST /api/<entity>
pub async fn create(
    entity: &'static Entity,
    state: AppState,
    credential: Credential,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(body) = payload?;
    let Some(surface) = entity.create else {
        return Err(ApiError::bad_request(format!("{} records cannot be created here", entity.label)));
    };

    let mut doc = into_document(body)?;
    if let Some(field) = entity.region_field {
        apply_region(&mut doc, field, &state.config.api.default_region, true);
    }
    let doc = Value::Object(doc);

    let headers = credential.headers();
    let failure = entity.failure(Operation::Create);
    let record = match surface {
        Surface::Rpc => {
            let method = entity.method(state.namespace(), RpcMethod::Create);
            state.erp.call(&headers, &method, &doc, &failure).await?
        }
        Surface::Resource => state.erp.insert_doc(&headers, entity.doctype, &doc, &failure).await?,
    };

    let fetch_method = entity.method(state.namespace(), RpcMethod::Get);
    let record = match entity.enrichment(&fetch_method) {
        Some(enrichment) => state.erp.enrich(&headers, record, &enrichment).await,
        None => record,
    };

    Ok(ApiResponse::created(record))
}

/// PUT /api/<entity>/:id
pub async fn update(
    entity: &'static Entity,
    state: AppState,
    credential: Credential,
    id: String,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(body) = payload?;
    let mut doc = into_document(body)?;
    if let Some(field) = entity.region_field {
        apply_region(&mut doc, field, &state.config.api.default_region, false);
    }

    let record = state
        .erp
        .update_doc(
            &credential.headers(),
            entity.doctype,
            &id,
            &Value::Object(doc),
            &entity.failure(Operation::Update),
        )
        .await?;

    Ok(ApiResponse::success(record))
}

/// DELETE /api/<entity>/:id
pub async fn remove(entity: &'static Entity, state: AppState, credential: Credential, id: String) -> ApiResult<Value> {
    state
        .erp
        .delete_doc(&credential.headers(), entity.doctype, &id, &entity.failure(Operation::Delete))
        .await?;

    Ok(ApiResponse::success(json!({ "deleted": id })))
}

fn into_document(body: Value) -> Result<Map<String, Value>, ApiError> {
    match body {
        Value::Object(doc) => Ok(doc),
        _ => Err(ApiError::bad_request("Request body must be a JSON object")),
    }
}
