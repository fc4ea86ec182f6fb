//! Vector space endpoints.
//!
//! Only `stats` reflects engine state. Projection, search, and clustering
//! return well-formed empty results.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use ragstudio_core::defaults::VECTOR_TOP_K;
use serde::Deserialize;
use serde_json::json;

use crate::services::{Envelope, VectorStats};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ProjectionParams {
    #[serde(default = "default_projection_method")]
    pub method: String,
    #[serde(default = "default_dimensions")]
    pub dimensions: u8,
    pub content_type: Option<String>,
}

fn default_projection_method() -> String {
    "umap".to_string()
}

fn default_dimensions() -> u8 {
    2
}

#[utoipa::path(get, path = "/api/v1/vectors/projection", tag = "Vectors",
    responses((status = 200, description = "Projected points (currently empty) with vector counts")))]
pub async fn projection(
    State(state): State<AppState>,
    Query(params): Query<ProjectionParams>,
) -> Json<serde_json::Value> {
    let (total_vectors, embedding_dim) = match state.rag.vector_stats().await.into_result() {
        Ok(stats) => (stats.total_chunks, stats.embedding_dim),
        Err(_) => (0, state.settings.engine.llm.embedding_dim),
    };

    Json(json!({
        "method": params.method,
        "dimensions": params.dimensions,
        "points": [],
        "metadata": {
            "total_vectors": total_vectors,
            "embedding_dim": embedding_dim,
        },
    }))
}

#[derive(Debug, Deserialize)]
pub struct SimilarityParams {
    pub query_text: Option<String>,
    pub vector_id: Option<String>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    VECTOR_TOP_K
}

#[utoipa::path(get, path = "/api/v1/vectors/search", tag = "Vectors",
    responses((status = 200, description = "Nearest vectors (currently empty)")))]
pub async fn similarity_search(Query(params): Query<SimilarityParams>) -> Json<serde_json::Value> {
    let query = params.query_text.or(params.vector_id);
    Json(json!({
        "query": query,
        "results": [],
        "top_k": params.top_k,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ClusterParams {
    #[serde(default = "default_cluster_method")]
    pub method: String,
    pub n_clusters: Option<usize>,
}

fn default_cluster_method() -> String {
    "kmeans".to_string()
}

#[utoipa::path(get, path = "/api/v1/vectors/clusters", tag = "Vectors",
    responses((status = 200, description = "Clusters (currently empty)")))]
pub async fn clusters(Query(params): Query<ClusterParams>) -> Json<serde_json::Value> {
    Json(json!({
        "method": params.method,
        "n_clusters": params.n_clusters.unwrap_or(0),
        "clusters": [],
        "silhouette_score": 0,
    }))
}

#[utoipa::path(get, path = "/api/v1/vectors/stats", tag = "Vectors",
    responses(
        (status = 200, description = "Chunk, entity, and relationship counts"),
        (status = 500, description = "Engine failure"),
    ))]
pub async fn vector_stats(
    State(state): State<AppState>,
) -> (StatusCode, Json<Envelope<VectorStats>>) {
    let envelope = state.rag.vector_stats().await;
    let status = if envelope.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(envelope))
}
