//! # ragstudio-engine
//!
//! Adapters implementing [`ragstudio_core::RagEngine`].
//!
//! - [`HttpRagEngine`] talks JSON over HTTP to an external engine service.
//! - `MockRagEngine` (feature `mock`) returns canned results for tests.

pub mod config;
pub mod http;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use config::{EngineConfig, LlmConfig};
pub use http::HttpRagEngine;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockCall, MockRagEngine};
