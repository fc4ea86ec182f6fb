//! Query endpoints.

use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use ragstudio_core::defaults::HISTORY_PAGE_LIMIT;
use ragstudio_core::{MultimodalContent, QuerySource, RetrievalMode};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default)]
    pub vlm_enhanced: bool,
    pub top_k: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct MultimodalQueryRequest {
    pub query: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default)]
    pub multimodal_content: Vec<MultimodalContent>,
}

fn default_mode() -> String {
    RetrievalMode::default().to_string()
}

#[derive(Debug, Serialize)]
pub struct QueryMetadata {
    /// Seconds spent in the engine call.
    pub response_time: f64,
    pub chunks_retrieved: usize,
    pub vlm_enhanced: bool,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub query: String,
    pub mode: RetrievalMode,
    pub answer: String,
    pub sources: Vec<QuerySource>,
    pub metadata: QueryMetadata,
}

#[derive(Debug, Serialize)]
pub struct MultimodalQueryResponse {
    pub query: String,
    pub mode: RetrievalMode,
    pub answer: String,
    pub multimodal_evidence: Vec<MultimodalContent>,
    pub sources: Vec<QuerySource>,
}

fn validate_query(query: &str) -> Result<(), ApiError> {
    if query.trim().is_empty() {
        return Err(ApiError::BadRequest("Query must not be empty".to_string()));
    }
    Ok(())
}

/// Execute a text query against the knowledge base.
///
/// Modes: `naive`, `local`, `global`, `hybrid` (default). Any other mode is
/// rejected with 400.
#[utoipa::path(post, path = "/api/v1/query/", tag = "Query",
    responses(
        (status = 200, description = "Answer with sources"),
        (status = 400, description = "Empty query or unsupported mode"),
        (status = 500, description = "Engine failure"),
    ))]
pub async fn execute_query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(req) = payload?;
    validate_query(&req.query)?;
    let mode: RetrievalMode = req.mode.parse()?;

    let start = Instant::now();
    let outcome = state
        .rag
        .query(&req.query, mode, req.vlm_enhanced, req.top_k)
        .await
        .into_result()
        .map_err(ApiError::Upstream)?;
    let response_time = start.elapsed().as_secs_f64();

    Ok(Json(QueryResponse {
        query: outcome.query,
        mode: outcome.mode,
        answer: outcome.answer,
        sources: outcome.sources,
        metadata: QueryMetadata {
            response_time,
            chunks_retrieved: outcome.chunks_retrieved,
            vlm_enhanced: outcome.vlm_enhanced,
        },
    }))
}

/// Execute a query with images, tables, equations, or extra text attached.
#[utoipa::path(post, path = "/api/v1/query/multimodal", tag = "Query",
    responses(
        (status = 200, description = "Answer with the supplied evidence echoed back"),
        (status = 400, description = "Invalid query, mode, or content item"),
        (status = 500, description = "Engine failure"),
    ))]
pub async fn execute_multimodal_query(
    State(state): State<AppState>,
    payload: Result<Json<MultimodalQueryRequest>, JsonRejection>,
) -> Result<Json<MultimodalQueryResponse>, ApiError> {
    let Json(req) = payload?;
    validate_query(&req.query)?;
    let mode: RetrievalMode = req.mode.parse()?;
    for item in &req.multimodal_content {
        item.validate()?;
    }

    let evidence = req.multimodal_content.clone();
    let outcome = state
        .rag
        .query_multimodal(&req.query, mode, req.multimodal_content)
        .await
        .into_result()
        .map_err(ApiError::Upstream)?;

    Ok(Json(MultimodalQueryResponse {
        query: outcome.query,
        mode: outcome.mode,
        answer: outcome.answer,
        multimodal_evidence: evidence,
        sources: outcome.sources,
    }))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    #[serde(default = "default_history_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_history_limit() -> usize {
    HISTORY_PAGE_LIMIT
}

/// Query history. Nothing is persisted, so the list is always empty.
#[utoipa::path(get, path = "/api/v1/query/history", tag = "Query",
    responses((status = 200, description = "Empty history page")))]
pub async fn query_history(Query(params): Query<HistoryParams>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "queries": [],
        "total": 0,
        "limit": params.limit,
        "offset": params.offset,
    }))
}

#[derive(Debug, Deserialize)]
pub struct FeedbackParams {
    pub query_id: String,
    pub feedback: String,
    pub comment: Option<String>,
}

/// Record feedback on an answer. Accepted and logged, not stored.
#[utoipa::path(post, path = "/api/v1/query/feedback", tag = "Query",
    responses(
        (status = 200, description = "Feedback accepted"),
        (status = 400, description = "Feedback is not positive or negative"),
    ))]
pub async fn query_feedback(
    Query(params): Query<FeedbackParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if params.feedback != "positive" && params.feedback != "negative" {
        return Err(ApiError::BadRequest(format!(
            "feedback must be 'positive' or 'negative', got '{}'",
            params.feedback
        )));
    }
    info!(
        query_id = %params.query_id,
        feedback = %params.feedback,
        has_comment = params.comment.is_some(),
        "Query feedback received"
    );

    Ok(Json(serde_json::json!({
        "message": "Feedback recorded successfully",
        "query_id": params.query_id,
        "feedback": params.feedback,
    })))
}
