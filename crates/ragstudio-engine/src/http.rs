//! HTTP adapter for an external retrieval engine service.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use ragstudio_core::defaults::ENGINE_HEALTH_TIMEOUT_SECS;
use ragstudio_core::{
    EngineStats, Error, GraphSnapshot, MultimodalContent, MultimodalQuery, ParseJob, ParseReport,
    QueryAnswer, RagEngine, Result, RetrievalMode, TextQuery, ENGINE_ADAPTER_VERSION,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{EngineConfig, LlmConfig};

/// Header carrying the adapter contract version.
pub const ADAPTER_VERSION_HEADER: &str = "X-Adapter-Version";

/// Header carrying the model provider credentials.
pub const LLM_API_KEY_HEADER: &str = "X-LLM-Api-Key";

/// Engine adapter speaking JSON over HTTP.
pub struct HttpRagEngine {
    client: Client,
    config: EngineConfig,
}

#[derive(Serialize)]
struct ParseRequest<'a> {
    file_path: &'a str,
    output_dir: &'a str,
    parser: &'a str,
    parse_method: &'a str,
    enable_image_processing: bool,
    enable_table_processing: bool,
    enable_equation_processing: bool,
    working_dir: &'a str,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    mode: RetrievalMode,
    vlm_enhanced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<usize>,
    llm: &'a LlmConfig,
}

#[derive(Serialize)]
struct MultimodalRequest<'a> {
    query: &'a str,
    mode: RetrievalMode,
    multimodal_content: &'a [MultimodalContent],
    llm: &'a LlmConfig,
}

impl HttpRagEngine {
    /// Create a new adapter. The client timeout bounds every engine call.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            base_url = %config.base_url,
            timeout_secs = config.timeout_secs,
            adapter_version = ENGINE_ADAPTER_VERSION,
            "Initializing HTTP engine adapter"
        );

        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(EngineConfig::from_env()?)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    fn authorize(&self, mut req: RequestBuilder) -> RequestBuilder {
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }
        req.header(ADAPTER_VERSION_HEADER, ENGINE_ADAPTER_VERSION.to_string())
            .header(LLM_API_KEY_HEADER, &self.config.llm.api_key)
    }

    async fn post<B, T>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.authorize(self.client.post(self.url(endpoint)).json(body));
        self.execute(endpoint, req).await
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let req = self.authorize(self.client.get(self.url(endpoint)));
        self.execute(endpoint, req).await
    }

    async fn execute<T: DeserializeOwned>(&self, endpoint: &str, req: RequestBuilder) -> Result<T> {
        let start = Instant::now();
        let response = req.send().await.map_err(|e| {
            warn!(endpoint, error = %e, "Engine request failed");
            Error::Engine(format!("Engine request failed: {}", e))
        })?;
        let response = check_status(response).await?;
        let parsed = response.json::<T>().await.map_err(|e| {
            Error::Serialization(format!("Failed to parse engine response: {}", e))
        })?;
        debug!(
            endpoint,
            duration_ms = start.elapsed().as_millis() as u64,
            "Engine call complete"
        );
        Ok(parsed)
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(status = %status, "Engine returned error status");
    Err(Error::Engine(format!("engine returned {}: {}", status, body)))
}

#[async_trait]
impl RagEngine for HttpRagEngine {
    fn name(&self) -> &str {
        "http"
    }

    async fn parse_document(&self, job: ParseJob) -> Result<ParseReport> {
        let request = ParseRequest {
            file_path: &job.file_path,
            output_dir: &job.output_dir,
            parser: &job.parser,
            parse_method: &job.parse_method,
            enable_image_processing: self.config.enable_image_processing,
            enable_table_processing: self.config.enable_table_processing,
            enable_equation_processing: self.config.enable_equation_processing,
            working_dir: &self.config.working_dir,
        };
        self.post("/v1/documents/parse", &request).await
    }

    async fn query(&self, query: TextQuery) -> Result<QueryAnswer> {
        let request = QueryRequest {
            query: &query.query,
            mode: query.mode,
            vlm_enhanced: query.vlm_enhanced,
            top_k: query.top_k,
            llm: &self.config.llm,
        };
        self.post("/v1/query", &request).await
    }

    async fn query_multimodal(&self, query: MultimodalQuery) -> Result<QueryAnswer> {
        let request = MultimodalRequest {
            query: &query.query,
            mode: query.mode,
            multimodal_content: &query.multimodal_content,
            llm: &self.config.llm,
        };
        self.post("/v1/query/multimodal", &request).await
    }

    async fn graph(&self, limit: usize) -> Result<GraphSnapshot> {
        let mut snapshot: GraphSnapshot = self.get(&format!("/v1/graph?limit={}", limit)).await?;
        snapshot.nodes.truncate(limit);
        let kept: std::collections::HashSet<&str> =
            snapshot.nodes.iter().map(|n| n.id.as_str()).collect();
        let edges = snapshot
            .edges
            .iter()
            .filter(|e| kept.contains(e.source.as_str()) && kept.contains(e.target.as_str()))
            .cloned()
            .collect();
        snapshot.edges = edges;
        Ok(snapshot)
    }

    async fn stats(&self) -> Result<EngineStats> {
        self.get("/v1/stats").await
    }

    async fn health_check(&self) -> Result<bool> {
        let req = self
            .authorize(self.client.get(self.url("/health")))
            .timeout(Duration::from_secs(ENGINE_HEALTH_TIMEOUT_SECS));
        match req.send().await {
            Ok(resp) if resp.status().is_success() => Ok(true),
            Ok(resp) => {
                warn!(status = %resp.status(), "Engine health check failed");
                Ok(false)
            }
            Err(e) => {
                warn!(error = %e, "Engine health check error");
                Ok(false)
            }
        }
    }
}
