use axum::{
    body::Body,
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, Query, State},
    http::{HeaderMap, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post, MethodRouter},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::entities::{self, Entity};
use crate::filter::ListQuery;
use crate::handlers::{protected, public};
use crate::middleware::Credential;
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let body_limit = state.config.api.max_request_size_bytes;
    let cors = cors_layer(&state);

    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        .merge(auth_routes());

    for entity in entities::ALL {
        router = router.merge(entity_routes(entity));
    }

    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                id = %uuid::Uuid::new_v4(),
                method = %request.method(),
                uri = %request.uri(),
            )
        }))
        .with_state(state)
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let security = &state.config.security;
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.is_empty() || state.config.is_development() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

fn auth_public_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/auth/login",
            post(|State(state): State<AppState>, payload: Result<Json<Value>, JsonRejection>| {
                public::auth::login(state, payload)
            }),
        )
        .route(
            "/api/auth/sso",
            post(|State(state): State<AppState>, headers: HeaderMap, payload: Option<Json<Value>>| {
                public::auth::sso_exchange(state, headers, payload)
            }),
        )
        .route(
            "/api/auth/refresh",
            post(|State(state): State<AppState>, payload: Result<Json<Value>, JsonRejection>| {
                public::auth::refresh(state, payload)
            }),
        )
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/auth/whoami",
            get(|State(state): State<AppState>, credential: Credential| protected::auth::whoami(state, credential)),
        )
        .route(
            "/api/auth/logout",
            post(|State(state): State<AppState>, credential: Credential| protected::auth::logout(state, credential)),
        )
}

/// `/api/<entity>` and `/api/<entity>/:id`, plus `/:id/events` for entities
/// with an event stream. Write routes exist only for writable entities.
fn entity_routes(entity: &'static Entity) -> Router<AppState> {
    use protected::{events, records};

    let mut collection: MethodRouter<AppState> = get(
        move |State(state): State<AppState>, credential: Credential, Query(query): Query<ListQuery>| {
            records::list(entity, state, credential, query)
        },
    );
    if entity.create.is_some() {
        collection = collection.post(
            move |State(state): State<AppState>, credential: Credential, payload: Result<Json<Value>, JsonRejection>| {
                records::create(entity, state, credential, payload)
            },
        );
    }

    let mut member: MethodRouter<AppState> = get(
        move |State(state): State<AppState>, credential: Credential, Path(id): Path<String>| {
            records::show(entity, state, credential, id)
        },
    );
    if entity.writable {
        member = member
            .put(
                move |State(state): State<AppState>,
                      credential: Credential,
                      Path(id): Path<String>,
                      payload: Result<Json<Value>, JsonRejection>| {
                    records::update(entity, state, credential, id, payload)
                },
            )
            .delete(
                move |State(state): State<AppState>, credential: Credential, Path(id): Path<String>| {
                    records::remove(entity, state, credential, id)
                },
            );
    }

    let mut router = Router::new()
        .route(&format!("/api/{}", entity.path), collection)
        .route(&format!("/api/{}/:id", entity.path), member);

    if entity.event_stream {
        router = router.route(
            &format!("/api/{}/:id/events", entity.path),
            get(move |State(state): State<AppState>, credential: Credential, Path(id): Path<String>| {
                events::stream(entity, state, credential, id)
            }),
        );
    }

    router
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");
    let resources: Vec<String> = entities::ALL
        .iter()
        .map(|e| format!("/api/{}[/:id]", e.path))
        .collect();

    Json(json!({
        "success": true,
        "data": {
            "name": "LoRaWAN Network Console API",
            "version": version,
            "description": "Proxy between the console UI and ERPNext / Keycloak",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "public_auth": "/api/auth/login, /api/auth/sso, /api/auth/refresh (public - credential acquisition)",
                "auth": "/api/auth/whoami, /api/auth/logout (protected)",
                "resources": resources,
                "events": "/api/gateways/:id/events, /api/devices/:id/events (protected, text/event-stream)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.erp.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "upstream": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "message": "upstream unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "upstream_error": e.to_string()
                }
            })),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::body::to_bytes;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn state_for(erp_url: &str) -> AppState {
        let mut config = AppConfig::development();
        config.upstream.erp_base_url = erp_url.to_string();
        config.upstream.enrichment_delay_ms = 10;
        AppState::from_config(config).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn root_lists_resources() {
        let app = app(state_for("http://127.0.0.1:9"));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["endpoints"]["resources"].as_array().unwrap().len(), entities::ALL.len());
    }

    #[tokio::test]
    async fn protected_route_without_credential_is_401() {
        let erp = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&erp)
            .await;

        let app = app(state_for(&erp.uri()));
        let response = app
            .oneshot(Request::builder().uri("/api/tenants").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await, json!({"message": "Authentication required"}));
    }

    #[tokio::test]
    async fn read_only_entity_has_no_write_routes() {
        let app = app(state_for("http://127.0.0.1:9"));
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/subscriptions/SUB-1")
                    .header("authorization", "Bearer sid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn health_reports_upstream_state() {
        let erp = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/method/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "pong"})))
            .mount(&erp)
            .await;

        let response = app(state_for(&erp.uri()))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app(state_for("http://127.0.0.1:9"))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn malformed_body_is_400_with_message() {
        let app = app(state_for("http://127.0.0.1:9"));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/gateways")
                    .header("authorization", "Bearer sid")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["message"].is_string());
    }
}
