//! System health and status.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

#[utoipa::path(get, path = "/api/v1/system/health", tag = "System",
    responses((status = 200, description = "healthy when the engine is reachable, else initializing")))]
pub async fn system_health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let health = state.rag.health().await;
    let status = if health.engine_reachable {
        "healthy"
    } else {
        "initializing"
    };
    Json(json!({
        "status": status,
        "rag_service": health,
    }))
}

#[utoipa::path(get, path = "/api/v1/system/status", tag = "System",
    responses(
        (status = 200, description = "Engine health, vector counts, and live connections"),
        (status = 500, description = "Engine stats unavailable"),
    ))]
pub async fn system_status(State(state): State<AppState>) -> impl IntoResponse {
    let health = state.rag.health().await;
    let stats = match state.rag.vector_stats().await.into_result() {
        Ok(stats) => stats,
        Err(error) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": error,
                    "message": "Failed to get system status",
                })),
            );
        }
    };

    (
        StatusCode::OK,
        Json(json!({
            "health": health,
            "vector_stats": stats,
            "connections": {
                "clients": state.connections.client_count(),
                "total": state.connections.total_connections(),
            },
            "message": "System operational",
        })),
    )
}
