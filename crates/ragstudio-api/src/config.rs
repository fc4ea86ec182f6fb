//! Process-wide settings, read once from the environment at startup.

use std::path::PathBuf;

use ragstudio_core::defaults;
use ragstudio_core::env::{flag_or, list_or, parse_or, var_or};
use ragstudio_core::Result;
use ragstudio_engine::EngineConfig;

/// Server settings. Engine and model settings live in [`EngineConfig`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub app_name: String,
    pub app_version: String,
    /// Prefix for every API route except `/health`.
    pub api_prefix: String,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    /// Root for uploads and parsed output.
    pub output_dir: PathBuf,
    pub max_upload_size: u64,
    /// Dotted, lowercase extensions accepted for upload.
    pub allowed_extensions: Vec<String>,
    pub parser: String,
    pub parse_method: String,
    pub rate_limit_enabled: bool,
    pub rate_limit_per_minute: u32,
    pub engine: EngineConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: defaults::APP_NAME.to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            api_prefix: defaults::API_V1_PREFIX.to_string(),
            host: defaults::SERVER_HOST.to_string(),
            port: defaults::SERVER_PORT,
            cors_origins: defaults::CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
            output_dir: PathBuf::from(defaults::OUTPUT_DIR),
            max_upload_size: defaults::MAX_UPLOAD_SIZE,
            allowed_extensions: defaults::ALLOWED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            parser: defaults::PARSER.to_string(),
            parse_method: defaults::PARSE_METHOD.to_string(),
            rate_limit_enabled: true,
            rate_limit_per_minute: defaults::RATE_LIMIT_PER_MINUTE,
            engine: EngineConfig::default(),
        }
    }
}

impl Settings {
    /// Load from environment variables. Fails when a required value
    /// (`OPENAI_API_KEY`) is missing.
    pub fn from_env() -> Result<Self> {
        let allowed_extensions = list_or("ALLOWED_EXTENSIONS", defaults::ALLOWED_EXTENSIONS)
            .into_iter()
            .map(|ext| normalize_extension(&ext))
            .collect();

        Ok(Self {
            app_name: var_or("APP_NAME", defaults::APP_NAME),
            app_version: var_or("APP_VERSION", env!("CARGO_PKG_VERSION")),
            api_prefix: normalize_prefix(&var_or("API_V1_PREFIX", defaults::API_V1_PREFIX)),
            host: var_or("HOST", defaults::SERVER_HOST),
            port: parse_or("PORT", defaults::SERVER_PORT),
            cors_origins: list_or("CORS_ORIGINS", defaults::CORS_ORIGINS),
            output_dir: PathBuf::from(var_or("OUTPUT_DIR", defaults::OUTPUT_DIR)),
            max_upload_size: parse_or("MAX_UPLOAD_SIZE", defaults::MAX_UPLOAD_SIZE),
            allowed_extensions,
            parser: var_or("PARSER", defaults::PARSER),
            parse_method: var_or("PARSE_METHOD", defaults::PARSE_METHOD),
            rate_limit_enabled: flag_or("RATE_LIMIT_ENABLED", true),
            rate_limit_per_minute: parse_or("RATE_LIMIT_PER_MINUTE", defaults::RATE_LIMIT_PER_MINUTE),
            engine: EngineConfig::from_env()?,
        })
    }

    /// Request body cap for the upload route.
    pub fn upload_body_limit(&self) -> usize {
        usize::try_from(
            self.max_upload_size
                .saturating_add(defaults::MULTIPART_OVERHEAD_BYTES),
        )
        .unwrap_or(usize::MAX)
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.api_prefix, "/api/v1");
        assert_eq!(settings.port, 8000);
        assert_eq!(settings.max_upload_size, 52_428_800);
        assert!(settings.allowed_extensions.contains(&".pdf".to_string()));
        assert_eq!(settings.cors_origins.len(), 3);
    }

    #[test]
    fn test_upload_body_limit_adds_overhead() {
        let settings = Settings {
            max_upload_size: 1000,
            ..Settings::default()
        };
        assert_eq!(settings.upload_body_limit(), 1000 + 64 * 1024);
    }

    #[test]
    fn test_upload_body_limit_saturates() {
        let settings = Settings {
            max_upload_size: u64::MAX - 1,
            ..Settings::default()
        };
        assert_eq!(settings.upload_body_limit(), usize::MAX);
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension("PDF"), ".pdf");
        assert_eq!(normalize_extension(" .Md "), ".md");
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("api/v2/"), "/api/v2");
        assert_eq!(normalize_prefix("/api/v1"), "/api/v1");
    }
}
