//! Messages pushed to real-time (WebSocket) clients.
//!
//! Serialized as `{"type": "<snake_case name>", "data": ...}`, e.g.:
//! `{"type":"parsing_progress","data":{"filename":"a.pdf","progress":100,...}}`

use serde::{Deserialize, Serialize};

/// Stage reported in a progress update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Uploaded,
    Processing,
    Completed,
    Failed,
}

/// Per-document progress envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub filename: String,
    /// Percentage, 0 to 100.
    pub progress: u8,
    pub status: ProgressStatus,
    #[serde(default)]
    pub message: String,
}

/// Everything the server sends over a real-time channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Document parsing progress for a client.
    ParsingProgress(ProgressUpdate),
    /// A client's own text frame, sent back to it.
    Echo(String),
}

impl ServerMessage {
    pub fn progress(
        filename: impl Into<String>,
        progress: u8,
        status: ProgressStatus,
        message: impl Into<String>,
    ) -> Self {
        Self::ParsingProgress(ProgressUpdate {
            filename: filename.into(),
            progress: progress.min(100),
            status,
            message: message.into(),
        })
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
