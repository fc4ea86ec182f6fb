//! Core traits for RAG Studio abstractions.
//!
//! Every call into the external retrieval engine goes through [`RagEngine`],
//! so the HTTP layer can run against a remote engine, a mock, or anything
//! else that speaks the same contract.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::*;

/// Version of the engine adapter contract. Sent with every engine request
/// so a mismatched engine can refuse early.
pub const ENGINE_ADAPTER_VERSION: u32 = 1;

// =============================================================================
// ENGINE
// =============================================================================

/// Backend for document parsing, retrieval, and index inspection.
#[async_trait]
pub trait RagEngine: Send + Sync {
    /// Short backend identifier for logs and health output.
    fn name(&self) -> &str;

    /// Contract version this backend implements.
    fn adapter_version(&self) -> u32 {
        ENGINE_ADAPTER_VERSION
    }

    /// Parse a stored document and index its content.
    async fn parse_document(&self, job: ParseJob) -> Result<ParseReport>;

    /// Answer a text query.
    async fn query(&self, query: TextQuery) -> Result<QueryAnswer>;

    /// Answer a query that carries images, tables, or equations.
    async fn query_multimodal(&self, query: MultimodalQuery) -> Result<QueryAnswer>;

    /// Snapshot of the knowledge graph, at most `limit` nodes.
    async fn graph(&self, limit: usize) -> Result<GraphSnapshot>;

    /// Aggregate index counts.
    async fn stats(&self) -> Result<EngineStats>;

    /// Check if the engine is reachable.
    async fn health_check(&self) -> Result<bool>;
}
