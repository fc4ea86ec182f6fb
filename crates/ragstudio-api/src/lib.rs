//! # ragstudio-api
//!
//! HTTP and WebSocket server for RAG Studio: document upload and parsing,
//! querying, and knowledge-graph and vector inspection, all forwarded to a
//! [`RagEngine`] through the [`RagService`] facade.

pub mod config;
pub mod error;
pub mod handlers;
pub mod services;
pub mod websocket;

use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use governor::{Quota, RateLimiter};
use ragstudio_core::RagEngine;
use ragstudio_storage::DocumentStore;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use utoipa::OpenApi;
use uuid::Uuid;

pub use config::Settings;
pub use error::ApiError;
pub use services::RagService;
pub use websocket::{Connection, ConnectionManager};

use handlers::{documents, graph, query, system, vectors};

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// STATE
// =============================================================================

pub type GlobalRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: DocumentStore,
    pub rag: Arc<RagService>,
    pub connections: Arc<ConnectionManager>,
    /// Global rate limiter (None if rate limiting is disabled).
    pub rate_limiter: Option<Arc<GlobalRateLimiter>>,
}

impl AppState {
    pub fn new(settings: Settings, engine: Arc<dyn RagEngine>) -> Self {
        let store = DocumentStore::new(&settings.output_dir, settings.max_upload_size);
        let rag = RagService::new(engine, store.clone(), &settings);

        let rate_limiter = if settings.rate_limit_enabled {
            NonZeroU32::new(settings.rate_limit_per_minute)
                .map(|n| Arc::new(RateLimiter::direct(Quota::per_minute(n))))
        } else {
            None
        };
        info!(
            enabled = rate_limiter.is_some(),
            per_minute = settings.rate_limit_per_minute,
            "Rate limiting configured"
        );

        Self {
            settings: Arc::new(settings),
            store,
            rag: Arc::new(rag),
            connections: Arc::new(ConnectionManager::new()),
            rate_limiter,
        }
    }
}

// =============================================================================
// OPENAPI
// =============================================================================

#[derive(OpenApi)]
#[openapi(
    info(
        title = "RAG-Anything Studio API",
        description = "Document ingestion, retrieval, and knowledge-graph inspection"
    ),
    paths(
        health_check,
        documents::upload_document,
        documents::parse_document,
        documents::list_documents,
        documents::get_document,
        documents::delete_document,
        query::execute_query,
        query::execute_multimodal_query,
        query::query_history,
        query::query_feedback,
        graph::graph_data,
        graph::graph_stats,
        graph::entity_details,
        graph::search_entities,
        graph::subgraph,
        vectors::projection,
        vectors::similarity_search,
        vectors::clusters,
        vectors::vector_stats,
        system::system_health,
        system::system_status,
    ),
    tags(
        (name = "Documents", description = "Upload, parse, list, and delete documents"),
        (name = "Query", description = "Retrieval-augmented queries"),
        (name = "Graph", description = "Knowledge graph inspection"),
        (name = "Vectors", description = "Vector space inspection"),
        (name = "System", description = "Health and status"),
    )
)]
pub struct ApiDoc;

async fn openapi_spec() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the full application router with middleware.
pub fn build_router(state: AppState) -> Router {
    let prefix = state.settings.api_prefix.clone();
    let upload_limit = state.settings.upload_body_limit();

    // The body limit rejects an oversized Content-Length before the handler
    // runs; its plain-text 413 is rewritten to the JSON error shape.
    let upload = Router::new()
        .route("/documents/upload", post(documents::upload_document))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(upload_limit))
        .layer(axum::middleware::map_response_with_state(
            state.clone(),
            payload_too_large_json,
        ));

    let api = Router::new()
        .merge(upload)
        // Documents
        .route("/documents/parse", post(documents::parse_document))
        .route("/documents/list", get(documents::list_documents))
        .route(
            "/documents/:id",
            get(documents::get_document).delete(documents::delete_document),
        )
        // Query
        .route("/query", post(query::execute_query))
        .route("/query/", post(query::execute_query))
        .route("/query/multimodal", post(query::execute_multimodal_query))
        .route("/query/history", get(query::query_history))
        .route("/query/feedback", post(query::query_feedback))
        // Graph
        .route("/graph/data", get(graph::graph_data))
        .route("/graph/stats", get(graph::graph_stats))
        .route("/graph/entity/:id", get(graph::entity_details))
        .route("/graph/search", get(graph::search_entities))
        .route("/graph/subgraph", get(graph::subgraph))
        // Vectors
        .route("/vectors/projection", get(vectors::projection))
        .route("/vectors/search", get(vectors::similarity_search))
        .route("/vectors/clusters", get(vectors::clusters))
        .route("/vectors/stats", get(vectors::vector_stats))
        // System
        .route("/system/health", get(system::system_health))
        .route("/system/status", get(system::system_status))
        // WebSocket
        .route("/ws/:client_id", get(handlers::websocket::ws_handler));

    let root = Router::new()
        .route("/health", get(health_check))
        .route("/api-docs/openapi.json", get(openapi_spec));
    let app = if prefix == "/" {
        root.merge(api)
    } else {
        root.nest(&prefix, api)
    };

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(parse_allowed_origins(
            &state.settings.cors_origins,
        )))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(
            ragstudio_core::defaults::CORS_MAX_AGE_SECS,
        ));

    app.layer(axum::middleware::from_fn_with_state(
        state.clone(),
        rate_limit_middleware,
    ))
    .layer(TraceLayer::new_for_http())
    .layer(PropagateRequestIdLayer::x_request_id())
    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
    .layer(cors)
    .layer(CatchPanicLayer::new())
    .with_state(state)
}

/// Parse CORS origins, skipping (and logging) invalid entries.
pub fn parse_allowed_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

/// Give a 413 produced by the body limit layer the `{"error": ...}` shape.
async fn payload_too_large_json(
    State(state): State<AppState>,
    response: axum::response::Response,
) -> axum::response::Response {
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));
    if response.status() != axum::http::StatusCode::PAYLOAD_TOO_LARGE || is_json {
        return response;
    }
    warn!(
        max_size = state.settings.max_upload_size,
        "Rejected upload by Content-Length"
    );
    ApiError::PayloadTooLarge(format!(
        "File too large. Maximum size: {} bytes",
        state.settings.max_upload_size
    ))
    .into_response()
}

// =============================================================================
// RATE LIMITING MIDDLEWARE
// =============================================================================

async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<impl IntoResponse, (axum::http::StatusCode, Json<serde_json::Value>)> {
    if let Some(limiter) = &state.rate_limiter {
        if limiter.check().is_err() {
            warn!("Rate limit exceeded");
            return Err((
                axum::http::StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "error": "rate_limit_exceeded",
                    "error_description": "Too many requests. Please wait before retrying."
                })),
            ));
        }
    }
    Ok(next.run(request).await)
}

// =============================================================================
// HEALTH CHECK
// =============================================================================

#[utoipa::path(get, path = "/health", tag = "System",
    responses((status = 200, description = "Server is up")))]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "app": state.settings.app_name,
        "version": state.settings.app_version,
    }))
}
