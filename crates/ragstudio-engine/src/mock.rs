//! Mock engine for deterministic testing.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ragstudio_engine::MockRagEngine;
//!
//! let engine = MockRagEngine::new()
//!     .with_answer("Paris")
//!     .with_stats(EngineStats { chunks: 10, ..Default::default() });
//!
//! let answer = engine.query(query).await?;
//! assert_eq!(answer.answer, "Paris");
//! assert_eq!(engine.call_count("query"), 1);
//! ```

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use ragstudio_core::defaults::OUTPUT_MARKER_FILE;
use ragstudio_core::{
    EngineStats, Error, GraphSnapshot, MultimodalQuery, ParseJob, ParseReport, QueryAnswer,
    QuerySource, RagEngine, Result, TextQuery,
};

/// Mock engine for testing.
#[derive(Clone)]
pub struct MockRagEngine {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    answer: Option<String>,
    graph: GraphSnapshot,
    stats: EngineStats,
    failure: Option<String>,
    write_marker: bool,
    latency_ms: u64,
}

/// One recorded engine call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
    pub timestamp: Instant,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            answer: None,
            graph: GraphSnapshot::default(),
            stats: EngineStats::default(),
            failure: None,
            write_marker: true,
            latency_ms: 0,
        }
    }
}

impl MockRagEngine {
    /// Create a mock engine with default configuration.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fixed answer for every query. Without it, answers echo the query.
    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).answer = Some(answer.into());
        self
    }

    /// Graph returned by `graph`, truncated to the requested limit.
    pub fn with_graph(mut self, graph: GraphSnapshot) -> Self {
        Arc::make_mut(&mut self.config).graph = graph;
        self
    }

    pub fn with_stats(mut self, stats: EngineStats) -> Self {
        Arc::make_mut(&mut self.config).stats = stats;
        self
    }

    /// Make every call fail with `Error::Engine(message)` and health report
    /// the engine as unreachable.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).failure = Some(message.into());
        self
    }

    /// Whether a successful parse writes the output marker file.
    pub fn with_marker_output(mut self, write_marker: bool) -> Self {
        Arc::make_mut(&mut self.config).write_marker = write_marker;
        self
    }

    /// Simulated latency for every call.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of calls to one operation.
    pub fn call_count(&self, operation: &str) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    pub fn clear_calls(&self) {
        self.call_log.lock().unwrap().clear()
    }

    async fn enter(&self, operation: &str, input: impl Into<String>) -> Result<()> {
        self.call_log.lock().unwrap().push(MockCall {
            operation: operation.to_string(),
            input: input.into(),
            timestamp: Instant::now(),
        });
        if self.config.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.config.latency_ms)).await;
        }
        match self.config.failure {
            Some(ref message) => Err(Error::Engine(message.clone())),
            None => Ok(()),
        }
    }

    fn answer_for(&self, query: &str, mode: &str) -> String {
        self.config
            .answer
            .clone()
            .unwrap_or_else(|| format!("Mock answer to '{}' ({})", query, mode))
    }
}

impl Default for MockRagEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RagEngine for MockRagEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn parse_document(&self, job: ParseJob) -> Result<ParseReport> {
        self.enter("parse_document", job.file_path.clone()).await?;

        if self.config.write_marker {
            let out = Path::new(&job.output_dir);
            tokio::fs::create_dir_all(out).await?;
            let name = Path::new(&job.file_path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let content = format!("## {}\n\nParsed with **{}**.\n", name, job.parser);
            tokio::fs::write(out.join(OUTPUT_MARKER_FILE), content).await?;
        }

        Ok(ParseReport {
            message: Some(format!("Parsed {}", job.file_path)),
            output_dir: Some(job.output_dir),
        })
    }

    async fn query(&self, query: TextQuery) -> Result<QueryAnswer> {
        self.enter("query", query.query.clone()).await?;
        let sources = vec![QuerySource {
            id: Some("chunk-1".to_string()),
            file_path: Some("mock.pdf".to_string()),
            content: Some("Mock source passage".to_string()),
            score: Some(0.9),
        }];
        Ok(QueryAnswer {
            answer: self.answer_for(&query.query, query.mode.as_str()),
            chunks_retrieved: sources.len(),
            sources,
        })
    }

    async fn query_multimodal(&self, query: MultimodalQuery) -> Result<QueryAnswer> {
        self.enter("query_multimodal", query.query.clone()).await?;
        Ok(QueryAnswer {
            answer: self.answer_for(&query.query, query.mode.as_str()),
            sources: Vec::new(),
            chunks_retrieved: query.multimodal_content.len(),
        })
    }

    async fn graph(&self, limit: usize) -> Result<GraphSnapshot> {
        self.enter("graph", limit.to_string()).await?;
        let mut snapshot = self.config.graph.clone();
        snapshot.nodes.truncate(limit);
        let ids: Vec<String> = snapshot.nodes.iter().map(|n| n.id.clone()).collect();
        snapshot
            .edges
            .retain(|e| ids.contains(&e.source) && ids.contains(&e.target));
        Ok(snapshot)
    }

    async fn stats(&self) -> Result<EngineStats> {
        self.enter("stats", "").await?;
        Ok(self.config.stats.clone())
    }

    async fn health_check(&self) -> Result<bool> {
        self.call_log.lock().unwrap().push(MockCall {
            operation: "health_check".to_string(),
            input: String::new(),
            timestamp: Instant::now(),
        });
        Ok(self.config.failure.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragstudio_core::{GraphEdge, GraphNode, RetrievalMode};

    fn node(id: &str) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            label: id.to_uppercase(),
            entity_type: "text".to_string(),
            description: None,
            source_document: None,
        }
    }

    fn text_query(q: &str) -> TextQuery {
        TextQuery {
            query: q.to_string(),
            mode: RetrievalMode::Naive,
            vlm_enhanced: false,
            top_k: None,
        }
    }

    #[tokio::test]
    async fn test_default_answer_echoes_query() {
        let engine = MockRagEngine::new();
        let answer = engine.query(text_query("why")).await.unwrap();
        assert_eq!(answer.answer, "Mock answer to 'why' (naive)");
        assert_eq!(engine.call_count("query"), 1);
    }

    #[tokio::test]
    async fn test_failure_applies_to_every_call() {
        let engine = MockRagEngine::new().with_failure("engine down");
        let err = engine.query(text_query("x")).await.unwrap_err();
        assert_eq!(err.to_string(), "Engine error: engine down");
        assert!(engine.stats().await.is_err());
        assert!(!engine.health_check().await.unwrap());
        assert_eq!(engine.get_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_graph_respects_limit() {
        let graph = GraphSnapshot {
            nodes: vec![node("a"), node("b"), node("c")],
            edges: vec![
                GraphEdge {
                    id: "e1".to_string(),
                    source: "a".to_string(),
                    target: "b".to_string(),
                    label: "rel".to_string(),
                    weight: None,
                },
                GraphEdge {
                    id: "e2".to_string(),
                    source: "b".to_string(),
                    target: "c".to_string(),
                    label: "rel".to_string(),
                    weight: None,
                },
            ],
        };
        let engine = MockRagEngine::new().with_graph(graph);
        let snapshot = engine.graph(2).await.unwrap();
        assert_eq!(snapshot.nodes.len(), 2);
        assert_eq!(snapshot.edges.len(), 1);
        assert_eq!(snapshot.edges[0].id, "e1");
    }

    #[tokio::test]
    async fn test_parse_writes_marker() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("report");
        let engine = MockRagEngine::new();
        let report = engine
            .parse_document(ParseJob {
                file_path: "uploads/report.pdf".to_string(),
                output_dir: out.display().to_string(),
                parser: "mineru".to_string(),
                parse_method: "auto".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(report.message.as_deref(), Some("Parsed uploads/report.pdf"));
        let content = std::fs::read_to_string(out.join("enhanced_content.md")).unwrap();
        assert!(content.starts_with("## report.pdf"));
    }

    #[tokio::test]
    async fn test_clear_calls() {
        let engine = MockRagEngine::new();
        engine.stats().await.unwrap();
        engine.clear_calls();
        assert!(engine.get_calls().is_empty());
    }
}
