//! Facade over the retrieval engine.
//!
//! Every engine call goes through [`RagService`], which fills in defaults
//! from settings, times the call, and folds the outcome into an
//! [`Envelope`]: `{"success": true, ...payload}` or
//! `{"success": false, "error": "...", ...context}`. Errors are stringified
//! here; handlers decide the status code.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use ragstudio_core::{
    GraphSnapshot, MultimodalContent, MultimodalQuery, ParseJob, QuerySource, RagEngine,
    RetrievalMode, TextQuery,
};
use ragstudio_storage::DocumentStore;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Settings;

/// Result wrapper returned by every facade operation except `health`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub context: Option<FailureContext>,
}

/// Request details echoed back alongside a failure.
#[derive(Debug, Default, Clone, Serialize)]
pub struct FailureContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub message: String,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            context: None,
        }
    }

    pub fn failed(error: impl Into<String>, context: FailureContext) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            context: Some(context),
        }
    }

    /// Payload on success, error text on failure.
    pub fn into_result(self) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(self.error.unwrap_or_else(|| "unknown error".to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParseOutcome {
    pub file_path: String,
    pub parser: String,
    pub parse_method: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub query: String,
    pub mode: RetrievalMode,
    pub answer: String,
    pub sources: Vec<QuerySource>,
    pub chunks_retrieved: usize,
    pub vlm_enhanced: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MultimodalOutcome {
    pub query: String,
    pub mode: RetrievalMode,
    pub answer: String,
    pub sources: Vec<QuerySource>,
    pub multimodal_content_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorStats {
    pub total_chunks: usize,
    pub total_entities: usize,
    pub total_relationships: usize,
    pub embedding_dim: usize,
}

/// Facade health, reported unwrapped.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealth {
    pub initialized: bool,
    pub engine: String,
    pub adapter_version: u32,
    pub engine_reachable: bool,
    pub working_dir: String,
    pub parser: String,
}

/// The one engine facade, built at startup and shared through `AppState`.
pub struct RagService {
    engine: Arc<dyn RagEngine>,
    store: DocumentStore,
    parser: String,
    parse_method: String,
    working_dir: String,
    embedding_dim: usize,
}

impl RagService {
    pub fn new(engine: Arc<dyn RagEngine>, store: DocumentStore, settings: &Settings) -> Self {
        info!(
            engine = engine.name(),
            adapter_version = engine.adapter_version(),
            parser = %settings.parser,
            "RAG service initialized"
        );
        Self {
            engine,
            store,
            parser: settings.parser.clone(),
            parse_method: settings.parse_method.clone(),
            working_dir: settings.engine.working_dir.clone(),
            embedding_dim: settings.engine.llm.embedding_dim,
        }
    }

    /// Parse a stored document. Output goes to the document's output dir.
    pub async fn parse_document(
        &self,
        file_path: &str,
        parser: Option<&str>,
        parse_method: Option<&str>,
    ) -> Envelope<ParseOutcome> {
        let parser = parser.unwrap_or(&self.parser).to_string();
        let parse_method = parse_method.unwrap_or(&self.parse_method).to_string();
        let fail = |error: String| {
            warn!(file_path, error = %error, "Document parsing failed");
            let message = format!("Parsing failed: {}", error);
            Envelope::failed(
                error,
                FailureContext {
                    file_path: Some(file_path.to_string()),
                    message,
                    ..Default::default()
                },
            )
        };

        let Some(filename) = Path::new(file_path).file_name().and_then(|n| n.to_str()) else {
            return fail(format!("No file name in path '{}'", file_path));
        };
        if let Err(e) = self.store.check_document_name(filename) {
            return fail(e.to_string());
        }
        let job = ParseJob {
            file_path: file_path.to_string(),
            output_dir: self.store.output_dir_for(filename).display().to_string(),
            parser: parser.clone(),
            parse_method: parse_method.clone(),
        };

        let start = Instant::now();
        match self.engine.parse_document(job).await {
            Ok(report) => {
                info!(
                    file_path,
                    parser = %parser,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Document parsed"
                );
                Envelope::ok(ParseOutcome {
                    file_path: file_path.to_string(),
                    parser,
                    parse_method,
                    message: report
                        .message
                        .unwrap_or_else(|| "Document parsed successfully".to_string()),
                })
            }
            Err(e) => fail(e.to_string()),
        }
    }

    pub async fn query(
        &self,
        query: &str,
        mode: RetrievalMode,
        vlm_enhanced: bool,
        top_k: Option<usize>,
    ) -> Envelope<QueryOutcome> {
        let start = Instant::now();
        let request = TextQuery {
            query: query.to_string(),
            mode,
            vlm_enhanced,
            top_k,
        };
        match self.engine.query(request).await {
            Ok(answer) => {
                info!(
                    %mode,
                    vlm_enhanced,
                    chunks = answer.chunks_retrieved,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Query answered"
                );
                Envelope::ok(QueryOutcome {
                    query: query.to_string(),
                    mode,
                    answer: answer.answer,
                    sources: answer.sources,
                    chunks_retrieved: answer.chunks_retrieved,
                    vlm_enhanced,
                })
            }
            Err(e) => {
                warn!(%mode, error = %e, "Query failed");
                Envelope::failed(
                    e.to_string(),
                    FailureContext {
                        query: Some(query.to_string()),
                        message: format!("Query failed: {}", e),
                        ..Default::default()
                    },
                )
            }
        }
    }

    pub async fn query_multimodal(
        &self,
        query: &str,
        mode: RetrievalMode,
        items: Vec<MultimodalContent>,
    ) -> Envelope<MultimodalOutcome> {
        let start = Instant::now();
        let count = items.len();
        let request = MultimodalQuery {
            query: query.to_string(),
            mode,
            multimodal_content: items,
        };
        match self.engine.query_multimodal(request).await {
            Ok(answer) => {
                info!(
                    %mode,
                    items = count,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Multimodal query answered"
                );
                Envelope::ok(MultimodalOutcome {
                    query: query.to_string(),
                    mode,
                    answer: answer.answer,
                    sources: answer.sources,
                    multimodal_content_count: count,
                })
            }
            Err(e) => {
                warn!(%mode, error = %e, "Multimodal query failed");
                Envelope::failed(
                    e.to_string(),
                    FailureContext {
                        query: Some(query.to_string()),
                        message: format!("Multimodal query failed: {}", e),
                        ..Default::default()
                    },
                )
            }
        }
    }

    pub async fn graph_data(&self, limit: usize) -> Envelope<GraphSnapshot> {
        match self.engine.graph(limit).await {
            Ok(snapshot) => Envelope::ok(snapshot),
            Err(e) => {
                warn!(limit, error = %e, "Graph fetch failed");
                Envelope::failed(
                    e.to_string(),
                    FailureContext {
                        message: format!("Graph fetch failed: {}", e),
                        ..Default::default()
                    },
                )
            }
        }
    }

    pub async fn vector_stats(&self) -> Envelope<VectorStats> {
        match self.engine.stats().await {
            Ok(stats) => Envelope::ok(VectorStats {
                total_chunks: stats.chunks,
                total_entities: stats.entities,
                total_relationships: stats.relationships,
                embedding_dim: stats.embedding_dim.unwrap_or(self.embedding_dim),
            }),
            Err(e) => {
                warn!(error = %e, "Vector stats failed");
                Envelope::failed(
                    e.to_string(),
                    FailureContext {
                        message: format!("Vector stats failed: {}", e),
                        ..Default::default()
                    },
                )
            }
        }
    }

    pub async fn health(&self) -> ServiceHealth {
        let engine_reachable = self.engine.health_check().await.unwrap_or(false);
        ServiceHealth {
            initialized: true,
            engine: self.engine.name().to_string(),
            adapter_version: self.engine.adapter_version(),
            engine_reachable,
            working_dir: self.working_dir.clone(),
            parser: self.parser.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragstudio_core::EngineStats;
    use ragstudio_engine::MockRagEngine;
    use tempfile::TempDir;

    fn service(engine: MockRagEngine, dir: &TempDir) -> RagService {
        let settings = Settings {
            output_dir: dir.path().to_path_buf(),
            ..Settings::default()
        };
        let store = DocumentStore::new(dir.path(), settings.max_upload_size);
        RagService::new(Arc::new(engine), store, &settings)
    }

    #[tokio::test]
    async fn test_parse_success_envelope() {
        let dir = TempDir::new().unwrap();
        let engine = MockRagEngine::new();
        let svc = service(engine.clone(), &dir);

        let envelope = svc.parse_document("/x/uploads/paper.pdf", None, Some("ocr")).await;
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["file_path"], "/x/uploads/paper.pdf");
        assert_eq!(json["parser"], "mineru");
        assert_eq!(json["parse_method"], "ocr");
        assert!(json.get("error").is_none());
        assert!(dir.path().join("paper/enhanced_content.md").exists());
        assert_eq!(engine.call_count("parse_document"), 1);
    }

    #[tokio::test]
    async fn test_parse_failure_keeps_context() {
        let dir = TempDir::new().unwrap();
        let svc = service(MockRagEngine::new().with_failure("parser crashed"), &dir);

        let envelope = svc.parse_document("a.pdf", None, None).await;
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["file_path"], "a.pdf");
        assert_eq!(json["error"], "Engine error: parser crashed");
        assert_eq!(json["message"], "Parsing failed: Engine error: parser crashed");
    }

    #[tokio::test]
    async fn test_parse_reserved_name_never_reaches_engine() {
        let dir = TempDir::new().unwrap();
        let engine = MockRagEngine::new();
        let svc = service(engine.clone(), &dir);

        let envelope = svc.parse_document("/x/uploads/uploads.pdf", None, None).await;
        assert!(!envelope.success);
        assert!(envelope.error.unwrap().contains("reserved"));
        assert_eq!(engine.call_count("parse_document"), 0);
        assert!(!dir.path().join("uploads/enhanced_content.md").exists());
    }

    #[tokio::test]
    async fn test_query_envelope() {
        let dir = TempDir::new().unwrap();
        let svc = service(MockRagEngine::new().with_answer("42"), &dir);

        let outcome = svc
            .query("meaning?", RetrievalMode::Local, true, Some(5))
            .await
            .into_result()
            .unwrap();
        assert_eq!(outcome.answer, "42");
        assert_eq!(outcome.mode, RetrievalMode::Local);
        assert!(outcome.vlm_enhanced);
        assert_eq!(outcome.chunks_retrieved, 1);
    }

    #[tokio::test]
    async fn test_query_failure_into_result() {
        let dir = TempDir::new().unwrap();
        let svc = service(MockRagEngine::new().with_failure("timeout"), &dir);

        let envelope = svc.query("q", RetrievalMode::Hybrid, false, None).await;
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["query"], "q");
        assert_eq!(json["message"], "Query failed: Engine error: timeout");
        assert_eq!(envelope.into_result().unwrap_err(), "Engine error: timeout");
    }

    #[tokio::test]
    async fn test_multimodal_counts_items() {
        let dir = TempDir::new().unwrap();
        let svc = service(MockRagEngine::new(), &dir);
        let items = vec![
            MultimodalContent::Table {
                table_data: "a,b".to_string(),
                table_caption: None,
            },
            MultimodalContent::Equation {
                latex: "x".to_string(),
                equation_caption: None,
            },
        ];

        let outcome = svc
            .query_multimodal("compare", RetrievalMode::Hybrid, items)
            .await
            .into_result()
            .unwrap();
        assert_eq!(outcome.multimodal_content_count, 2);
    }

    #[tokio::test]
    async fn test_vector_stats_falls_back_to_configured_dim() {
        let dir = TempDir::new().unwrap();
        let stats = EngineStats {
            chunks: 12,
            entities: 7,
            relationships: 3,
            embedding_dim: None,
        };
        let svc = service(MockRagEngine::new().with_stats(stats), &dir);

        let vs = svc.vector_stats().await.into_result().unwrap();
        assert_eq!(
            vs,
            VectorStats {
                total_chunks: 12,
                total_entities: 7,
                total_relationships: 3,
                embedding_dim: 3072,
            }
        );
    }

    #[tokio::test]
    async fn test_health_reports_engine() {
        let dir = TempDir::new().unwrap();
        let svc = service(MockRagEngine::new(), &dir);
        let health = svc.health().await;
        assert!(health.initialized);
        assert!(health.engine_reachable);
        assert_eq!(health.engine, "mock");
        assert_eq!(health.adapter_version, 1);

        let down = service(MockRagEngine::new().with_failure("down"), &dir);
        assert!(!down.health().await.engine_reachable);
    }
}
