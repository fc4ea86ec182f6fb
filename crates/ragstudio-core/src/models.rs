//! Domain models shared across RAG Studio crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

// =============================================================================
// DOCUMENTS
// =============================================================================

/// Coarse processing status derived from the presence of the output marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// The output marker file exists.
    Completed,
    /// No output marker yet (parsing not started, running, or failed).
    Processing,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Processing => "processing",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of one uploaded document, as returned by the list endpoint.
///
/// `chunks` and `entities` are approximations computed from the parsed
/// markdown (character count and heading/bold markers), not engine metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Identifier, equal to the filename.
    pub id: String,
    pub filename: String,
    pub path: String,
    pub size: u64,
    /// Same value as `content_type`, kept for frontend compatibility.
    #[serde(rename = "type")]
    pub kind: String,
    pub content_type: String,
    pub status: DocumentStatus,
    /// Unix seconds.
    pub uploaded_at: f64,
    pub created: f64,
    pub modified: f64,
    pub chunks: Option<usize>,
    pub entities: Option<usize>,
}

/// Full document view with a preview of the parsed output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentDetail {
    #[serde(flatten)]
    pub summary: DocumentSummary,
    pub content_preview: Option<String>,
    pub output_path: Option<String>,
}

/// Filter and pagination for listing documents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentFilter {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_document_limit")]
    pub limit: usize,
    /// Status name to match; a value that is neither status matches nothing.
    pub status: Option<String>,
    /// Case-insensitive filename substring.
    pub search: Option<String>,
}

fn default_document_limit() -> usize {
    crate::defaults::DOCUMENT_PAGE_LIMIT
}

/// One page of documents. `total` counts matches before pagination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentPage {
    pub documents: Vec<DocumentSummary>,
    pub total: usize,
    pub skip: usize,
    pub limit: usize,
}

/// A committed upload.
#[derive(Debug, Clone, Serialize)]
pub struct StoredUpload {
    pub filename: String,
    pub path: String,
    pub size: u64,
}

/// Result of deleting a document and its output directory.
#[derive(Debug, Clone, Serialize)]
pub struct DeletedDocument {
    pub filename: String,
    pub deleted_file: String,
    /// Output directory that was removed, if one existed.
    pub deleted_output: Option<String>,
}

// =============================================================================
// QUERIES
// =============================================================================

/// How the engine traverses its graph/vector indices to answer a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    /// Vector search only.
    Naive,
    /// Entity-centric graph neighborhood.
    Local,
    /// Relationship-centric global graph.
    Global,
    /// Local and global combined.
    #[default]
    Hybrid,
}

impl RetrievalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Naive => "naive",
            Self::Local => "local",
            Self::Global => "global",
            Self::Hybrid => "hybrid",
        }
    }
}

impl FromStr for RetrievalMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "naive" => Ok(Self::Naive),
            "local" => Ok(Self::Local),
            "global" => Ok(Self::Global),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(Error::InvalidInput(format!(
                "Unsupported retrieval mode '{}'. Supported: naive, local, global, hybrid",
                other
            ))),
        }
    }
}

impl fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Auxiliary non-text evidence supplied alongside a query.
///
/// Serialized with a `type` tag, e.g.
/// `{"type":"table","table_data":"a,b\n1,2","table_caption":"Totals"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MultimodalContent {
    Image {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        img_path: Option<String>,
        /// Base64-encoded image bytes.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_data: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_caption: Option<String>,
    },
    Table {
        table_data: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        table_caption: Option<String>,
    },
    Equation {
        latex: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        equation_caption: Option<String>,
    },
    Text {
        content: String,
    },
}

impl MultimodalContent {
    /// Reject items that carry no usable payload.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Image {
                img_path,
                image_data,
                ..
            } if img_path.is_none() && image_data.is_none() => Err(Error::InvalidInput(
                "image content requires img_path or image_data".to_string(),
            )),
            Self::Table { table_data, .. } if table_data.trim().is_empty() => Err(
                Error::InvalidInput("table content requires table_data".to_string()),
            ),
            Self::Equation { latex, .. } if latex.trim().is_empty() => Err(Error::InvalidInput(
                "equation content requires latex".to_string(),
            )),
            Self::Text { content } if content.trim().is_empty() => Err(Error::InvalidInput(
                "text content requires content".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// A text query forwarded to the engine.
#[derive(Debug, Clone, Serialize)]
pub struct TextQuery {
    pub query: String,
    pub mode: RetrievalMode,
    pub vlm_enhanced: bool,
    pub top_k: Option<usize>,
}

/// A text query with multimodal evidence.
#[derive(Debug, Clone, Serialize)]
pub struct MultimodalQuery {
    pub query: String,
    pub mode: RetrievalMode,
    pub multimodal_content: Vec<MultimodalContent>,
}

/// A retrieved passage the engine used to answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuerySource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub score: Option<f32>,
}

/// Engine answer to a text or multimodal query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<QuerySource>,
    #[serde(default)]
    pub chunks_retrieved: usize,
}

// =============================================================================
// PARSING
// =============================================================================

/// A document parse request handed to the engine.
#[derive(Debug, Clone, Serialize)]
pub struct ParseJob {
    pub file_path: String,
    pub output_dir: String,
    pub parser: String,
    pub parse_method: String,
}

/// Engine acknowledgement of a completed parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseReport {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub output_dir: Option<String>,
}

// =============================================================================
// KNOWLEDGE GRAPH
// =============================================================================

/// An entity in the engine's knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(default)]
    pub label: String,
    /// Entity category (e.g. "text", "image", "table", "person").
    #[serde(default)]
    pub entity_type: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Upload filename the entity was extracted from.
    #[serde(default)]
    pub source_document: Option<String>,
}

/// A relationship between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub weight: Option<f64>,
}

/// Nodes and edges returned by the engine, at most `limit` nodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

// =============================================================================
// VECTORS
// =============================================================================

/// Aggregate counts reported by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    #[serde(default)]
    pub chunks: usize,
    #[serde(default)]
    pub entities: usize,
    #[serde(default)]
    pub relationships: usize,
    #[serde(default)]
    pub embedding_dim: Option<usize>,
}
