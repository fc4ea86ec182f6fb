//! # ragstudio-core
//!
//! Core types, traits, and abstractions for RAG Studio.
//!
//! This crate provides the data structures shared by the document store,
//! the engine adapter, and the HTTP layer, plus the [`RagEngine`] trait
//! that isolates every call into the external retrieval engine.

pub mod defaults;
pub mod env;
pub mod error;
pub mod events;
pub mod file_safety;
pub mod graph;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use events::{ProgressStatus, ProgressUpdate, ServerMessage};
pub use file_safety::{
    content_type_for_extension, detect_content_type, detect_executable, extension_of,
    is_allowed_extension, is_safe_document_id, sanitize_filename,
};
pub use graph::{ConnectionDirection, EntityConnection, EntityDetail, GraphStats};
pub use models::*;
pub use traits::*;
