//! Error types for RAG Studio.

use thiserror::Error;

/// Result type alias using RAG Studio's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for RAG Studio operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input (bad extension, bad mode, malformed identifier)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Upload exceeded the configured size cap
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// The retrieval engine rejected or failed a call
    #[error("Engine error: {0}")]
    Engine(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A real-time connection was closed before the send completed
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
