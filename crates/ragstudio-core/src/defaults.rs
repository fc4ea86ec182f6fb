//! Centralized default constants for RAG Studio.
//!
//! Every crate and the settings loader reference these constants instead of
//! defining their own magic numbers. Organized by domain area.

// =============================================================================
// APPLICATION
// =============================================================================

/// Application name reported by the top-level health endpoint.
pub const APP_NAME: &str = "RAG-Anything Studio";

/// Prefix for all versioned API routes.
pub const API_V1_PREFIX: &str = "/api/v1";

// =============================================================================
// SERVER
// =============================================================================

/// Default bind host.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 8000;

/// Default CORS origins (the studio frontend in development).
pub const CORS_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:3001",
    "http://127.0.0.1:3000",
];

/// Default CORS max-age in seconds (1 hour).
pub const CORS_MAX_AGE_SECS: u64 = 3600;

/// Default rate limit: max requests per minute.
pub const RATE_LIMIT_PER_MINUTE: u32 = 100;

// =============================================================================
// MODELS
// =============================================================================

/// Default text generation model.
pub const LLM_MODEL: &str = "gpt-4o-mini";

/// Default vision model.
pub const VISION_MODEL: &str = "gpt-4o";

/// Default embedding model.
pub const EMBEDDING_MODEL: &str = "text-embedding-3-large";

/// Embedding dimension of text-embedding-3-large.
pub const EMBEDDING_DIM: usize = 3072;

// =============================================================================
// ENGINE
// =============================================================================

/// Default engine adapter base URL.
pub const ENGINE_URL: &str = "http://127.0.0.1:9621";

/// Timeout for a single engine call in seconds. Parsing large PDFs is slow.
pub const ENGINE_TIMEOUT_SECS: u64 = 300;

/// Timeout for the engine health probe in seconds.
pub const ENGINE_HEALTH_TIMEOUT_SECS: u64 = 5;

/// Default engine working directory.
pub const WORKING_DIR: &str = "./rag_storage";

/// Default document parser.
pub const PARSER: &str = "mineru";

/// Default parse method.
pub const PARSE_METHOD: &str = "auto";

// =============================================================================
// STORAGE
// =============================================================================

/// Default root for uploads and parsed output.
pub const OUTPUT_DIR: &str = "./output";

/// Subdirectory of the output root holding uploaded files.
pub const UPLOAD_SUBDIR: &str = "uploads";

/// Marker file whose presence means a document finished parsing.
pub const OUTPUT_MARKER_FILE: &str = "enhanced_content.md";

/// Upload size cap in bytes (50 MB).
pub const MAX_UPLOAD_SIZE: u64 = 50 * 1024 * 1024;

/// Slack added to the request body limit for multipart framing.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Leading bytes of an upload kept for executable and MIME sniffing.
pub const UPLOAD_SNIFF_BYTES: usize = 8192;

/// Hidden subdirectory of the upload dir holding in-flight `.part` files.
pub const PARTIAL_SUBDIR: &str = ".partial";

/// Extensions accepted by the upload endpoint.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".bmp", ".tiff", ".tif", ".gif", ".webp", ".doc", ".docx",
    ".ppt", ".pptx", ".xls", ".xlsx", ".txt", ".md",
];

/// Characters per chunk used by the chunk-count approximation.
pub const CHUNK_ESTIMATE_CHARS: usize = 500;

/// Length of the parsed-content preview in characters.
pub const CONTENT_PREVIEW_CHARS: usize = 500;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for the document list.
pub const DOCUMENT_PAGE_LIMIT: usize = 100;

/// Default page size for query history.
pub const HISTORY_PAGE_LIMIT: usize = 50;

/// Default node limit for graph data.
pub const GRAPH_NODE_LIMIT: usize = 1000;

/// Internal "fetch everything" node limit for graph statistics and lookups.
pub const GRAPH_FETCH_LIMIT: usize = 10_000;

/// Default result limit for entity search.
pub const ENTITY_SEARCH_LIMIT: usize = 20;

/// Default top-k for vector similarity search.
pub const VECTOR_TOP_K: usize = 10;

// =============================================================================
// REAL-TIME
// =============================================================================

/// Outbound queue capacity per WebSocket connection.
pub const WS_OUTBOUND_CAPACITY: usize = 64;

/// Interval between WebSocket ping frames in seconds.
pub const WS_PING_INTERVAL_SECS: u64 = 30;
