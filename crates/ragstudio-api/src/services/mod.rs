//! Service layer between the handlers and the engine.

pub mod rag_service;

pub use rag_service::{
    Envelope, FailureContext, MultimodalOutcome, ParseOutcome, QueryOutcome, RagService,
    ServiceHealth, VectorStats,
};
