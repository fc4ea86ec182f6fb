//! # ragstudio-storage
//!
//! Filesystem document store for RAG Studio.
//!
//! Uploaded files live in `{root}/uploads/`; the engine writes parsed output
//! for each document to `{root}/{stem}/`. A document counts as completed once
//! `{root}/{stem}/enhanced_content.md` exists.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ragstudio_storage::DocumentStore;
//!
//! let store = DocumentStore::new("./output", 50 * 1024 * 1024);
//! let mut upload = store.begin_upload("report.pdf").await?;
//! upload.write_chunk(&bytes).await?;
//! let stored = upload.commit().await?;
//! ```

mod store;
mod upload;

pub use store::DocumentStore;
pub use upload::UploadWriter;
