//! Knowledge graph endpoints.
//!
//! Data, statistics, and entity lookups are all derived from a snapshot
//! fetched from the engine. Search and subgraph return empty results.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use ragstudio_core::defaults::{ENTITY_SEARCH_LIMIT, GRAPH_FETCH_LIMIT, GRAPH_NODE_LIMIT};
use ragstudio_core::{EntityDetail, GraphSnapshot, GraphStats};
use serde::{Deserialize, Serialize};

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct GraphDataParams {
    pub content_type: Option<String>,
    pub document_id: Option<String>,
    #[serde(default = "default_node_limit")]
    pub limit: usize,
}

fn default_node_limit() -> usize {
    GRAPH_NODE_LIMIT
}

/// Cytoscape element wrapper.
#[derive(Debug, Serialize)]
pub struct Element<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct NodeData {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EdgeData {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct GraphMetadata {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub filtered: bool,
}

#[derive(Debug, Serialize)]
pub struct GraphDataResponse {
    pub nodes: Vec<Element<NodeData>>,
    pub edges: Vec<Element<EdgeData>>,
    pub metadata: GraphMetadata,
}

impl GraphDataResponse {
    fn from_snapshot(snapshot: GraphSnapshot, filtered: bool) -> Self {
        let metadata = GraphMetadata {
            total_nodes: snapshot.nodes.len(),
            total_edges: snapshot.edges.len(),
            filtered,
        };
        let nodes = snapshot
            .nodes
            .into_iter()
            .map(|n| Element {
                data: NodeData {
                    id: n.id,
                    label: n.label,
                    node_type: n.entity_type,
                    description: n.description,
                },
            })
            .collect();
        let edges = snapshot
            .edges
            .into_iter()
            .map(|e| Element {
                data: EdgeData {
                    id: e.id,
                    source: e.source,
                    target: e.target,
                    label: e.label,
                },
            })
            .collect();
        Self {
            nodes,
            edges,
            metadata,
        }
    }
}

async fn fetch_snapshot(state: &AppState, limit: usize) -> Result<GraphSnapshot, ApiError> {
    state
        .rag
        .graph_data(limit)
        .await
        .into_result()
        .map_err(ApiError::Upstream)
}

/// Knowledge graph in Cytoscape element format.
#[utoipa::path(get, path = "/api/v1/graph/data", tag = "Graph",
    params(
        ("content_type" = Option<String>, Query, description = "Keep nodes of this entity type"),
        ("document_id" = Option<String>, Query, description = "Keep nodes extracted from this document"),
        ("limit" = Option<usize>, Query, description = "Maximum nodes (default 1000)"),
    ),
    responses(
        (status = 200, description = "Nodes and edges"),
        (status = 500, description = "Engine failure"),
    ))]
pub async fn graph_data(
    State(state): State<AppState>,
    Query(params): Query<GraphDataParams>,
) -> Result<Json<GraphDataResponse>, ApiError> {
    let snapshot = fetch_snapshot(&state, params.limit).await?;
    let filtered = params.content_type.is_some() || params.document_id.is_some();
    let snapshot = if filtered {
        snapshot.filtered(
            params.content_type.as_deref(),
            params.document_id.as_deref(),
        )
    } else {
        snapshot
    };
    Ok(Json(GraphDataResponse::from_snapshot(snapshot, filtered)))
}

#[utoipa::path(get, path = "/api/v1/graph/stats", tag = "Graph",
    responses(
        (status = 200, description = "Node and edge counts, type histograms, density"),
        (status = 500, description = "Engine failure"),
    ))]
pub async fn graph_stats(State(state): State<AppState>) -> Result<Json<GraphStats>, ApiError> {
    let snapshot = fetch_snapshot(&state, GRAPH_FETCH_LIMIT).await?;
    Ok(Json(snapshot.stats()))
}

#[utoipa::path(get, path = "/api/v1/graph/entity/{id}", tag = "Graph",
    params(("id" = String, Path, description = "Entity id")),
    responses(
        (status = 200, description = "Entity with its connections"),
        (status = 404, description = "Entity not found"),
    ))]
pub async fn entity_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EntityDetail>, ApiError> {
    let snapshot = fetch_snapshot(&state, GRAPH_FETCH_LIMIT).await?;
    snapshot
        .entity(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Entity not found: {}", id)))
}

#[derive(Debug, Deserialize)]
pub struct EntitySearchParams {
    #[serde(default)]
    pub query: String,
    pub entity_type: Option<String>,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

fn default_search_limit() -> usize {
    ENTITY_SEARCH_LIMIT
}

#[utoipa::path(get, path = "/api/v1/graph/search", tag = "Graph",
    responses((status = 200, description = "Matching entities (currently always empty)")))]
pub async fn search_entities(Query(params): Query<EntitySearchParams>) -> Json<serde_json::Value> {
    tracing::debug!(
        query = %params.query,
        entity_type = ?params.entity_type,
        limit = params.limit,
        "Entity search"
    );
    Json(serde_json::json!({
        "query": params.query,
        "results": [],
        "total": 0,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SubgraphParams {
    #[serde(default)]
    pub center_node: String,
    #[serde(default = "default_depth")]
    pub depth: u32,
}

fn default_depth() -> u32 {
    1
}

#[utoipa::path(get, path = "/api/v1/graph/subgraph", tag = "Graph",
    responses((status = 200, description = "Neighborhood of a node (currently always empty)")))]
pub async fn subgraph(Query(params): Query<SubgraphParams>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "center_node": params.center_node,
        "depth": params.depth,
        "nodes": [],
        "edges": [],
    }))
}
