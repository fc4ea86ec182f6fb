//! Engine adapter configuration.
//!
//! Loaded from environment variables:
//!
//! | Variable | Default |
//! |---|---|
//! | `RAG_ENGINE_URL` | `http://127.0.0.1:9621` |
//! | `RAG_ENGINE_API_KEY` | unset |
//! | `RAG_ENGINE_TIMEOUT_SECS` | `300` |
//! | `OPENAI_API_KEY` | required |
//! | `OPENAI_BASE_URL` | unset |
//! | `DEFAULT_LLM_MODEL` / `DEFAULT_VISION_MODEL` / `DEFAULT_EMBEDDING_MODEL` | see `defaults` |
//! | `EMBEDDING_DIM` | `3072` |
//! | `WORKING_DIR` | `./rag_storage` |
//! | `ENABLE_IMAGE_PROCESSING` / `ENABLE_TABLE_PROCESSING` / `ENABLE_EQUATION_PROCESSING` | `true` |

use std::fmt;

use ragstudio_core::defaults;
use ragstudio_core::env::{flag_or, parse_or, var_opt, var_or};
use ragstudio_core::{Error, Result};
use serde::Serialize;
use tracing::debug;

/// Model selection and credentials forwarded to the engine.
#[derive(Clone, Serialize)]
pub struct LlmConfig {
    /// Sent as a header, never in a body.
    #[serde(skip)]
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub llm_model: String,
    pub vision_model: String,
    pub embedding_model: String,
    pub embedding_dim: usize,
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"[redacted]")
            .field("base_url", &self.base_url)
            .field("llm_model", &self.llm_model)
            .field("vision_model", &self.vision_model)
            .field("embedding_model", &self.embedding_model)
            .field("embedding_dim", &self.embedding_dim)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: None,
            llm_model: defaults::LLM_MODEL.to_string(),
            vision_model: defaults::VISION_MODEL.to_string(),
            embedding_model: defaults::EMBEDDING_MODEL.to_string(),
            embedding_dim: defaults::EMBEDDING_DIM,
        }
    }
}

/// Where the engine lives and what it should do when parsing.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub base_url: String,
    /// Bearer token for the engine service itself.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub working_dir: String,
    pub enable_image_processing: bool,
    pub enable_table_processing: bool,
    pub enable_equation_processing: bool,
    pub llm: LlmConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::ENGINE_URL.to_string(),
            api_key: None,
            timeout_secs: defaults::ENGINE_TIMEOUT_SECS,
            working_dir: defaults::WORKING_DIR.to_string(),
            enable_image_processing: true,
            enable_table_processing: true,
            enable_equation_processing: true,
            llm: LlmConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load from environment variables and validate.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            base_url: var_or("RAG_ENGINE_URL", defaults::ENGINE_URL),
            api_key: var_opt("RAG_ENGINE_API_KEY"),
            timeout_secs: parse_or("RAG_ENGINE_TIMEOUT_SECS", defaults::ENGINE_TIMEOUT_SECS),
            working_dir: var_or("WORKING_DIR", defaults::WORKING_DIR),
            enable_image_processing: flag_or("ENABLE_IMAGE_PROCESSING", true),
            enable_table_processing: flag_or("ENABLE_TABLE_PROCESSING", true),
            enable_equation_processing: flag_or("ENABLE_EQUATION_PROCESSING", true),
            llm: LlmConfig {
                api_key: var_opt("OPENAI_API_KEY").unwrap_or_default(),
                base_url: var_opt("OPENAI_BASE_URL"),
                llm_model: var_or("DEFAULT_LLM_MODEL", defaults::LLM_MODEL),
                vision_model: var_or("DEFAULT_VISION_MODEL", defaults::VISION_MODEL),
                embedding_model: var_or("DEFAULT_EMBEDDING_MODEL", defaults::EMBEDDING_MODEL),
                embedding_dim: parse_or("EMBEDDING_DIM", defaults::EMBEDDING_DIM),
            },
        };
        config.validate()?;
        debug!(
            base_url = %config.base_url,
            timeout_secs = config.timeout_secs,
            llm_model = %config.llm.llm_model,
            "Engine config loaded"
        );
        Ok(config)
    }

    /// Check required values.
    pub fn validate(&self) -> Result<()> {
        if self.llm.api_key.is_empty() {
            return Err(Error::Config("OPENAI_API_KEY is required".to_string()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "RAG_ENGINE_URL must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "RAG_ENGINE_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
