//! Document upload, parsing, listing, and deletion.

use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use ragstudio_core::{
    detect_content_type, detect_executable, extension_of, is_allowed_extension, DocumentDetail,
    DocumentFilter, DocumentPage, ProgressStatus,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::services::{Envelope, ParseOutcome};
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    /// WebSocket client to notify once the upload is stored.
    pub client_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
    pub file_path: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub content_type: String,
}

/// Upload a document (multipart field `file`).
///
/// The extension is checked before any byte is written; the body is then
/// streamed to disk with the size cap enforced as bytes arrive.
///
/// # Returns
/// - 200 OK with the stored filename, path, size, and content type
/// - 400 Bad Request for a missing file, disallowed extension, or executable
/// - 413 Payload Too Large when the file exceeds `MAX_UPLOAD_SIZE`
#[utoipa::path(post, path = "/api/v1/documents/upload", tag = "Documents",
    responses(
        (status = 200, description = "File stored"),
        (status = 400, description = "Invalid file"),
        (status = 413, description = "File too large"),
    ))]
pub async fn upload_document(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let original = field
            .file_name()
            .map(str::to_string)
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest("No filename provided".to_string()))?;

        if !is_allowed_extension(&original, &state.settings.allowed_extensions) {
            warn!(filename = %original, "Rejected upload with disallowed extension");
            return Err(ApiError::BadRequest(format!(
                "File type '{}' not allowed. Allowed types: {}",
                extension_of(&original),
                state.settings.allowed_extensions.join(", ")
            )));
        }

        let declared = field
            .content_type()
            .map(str::to_string)
            .filter(|ct| !ct.trim().is_empty());

        let mut writer = state.store.begin_upload(&original).await?;
        let mut inspected = false;
        while let Some(chunk) = field.chunk().await? {
            writer.write_chunk(&chunk).await?;
            if !inspected && writer.head_complete() {
                inspected = true;
                if let Some(kind) = detect_executable(writer.head()) {
                    writer.abort().await;
                    return Err(executable_rejected(&original, kind));
                }
            }
        }
        if !inspected {
            if let Some(kind) = detect_executable(writer.head()) {
                writer.abort().await;
                return Err(executable_rejected(&original, kind));
            }
        }

        let content_type = declared
            .unwrap_or_else(|| detect_content_type(writer.filename(), writer.head(), None));
        let stored = writer.commit().await?;
        info!(
            filename = %stored.filename,
            size = stored.size,
            content_type = %content_type,
            "Document uploaded"
        );

        if let Some(ref client_id) = params.client_id {
            state.connections.send_progress(
                client_id,
                &stored.filename,
                0,
                ProgressStatus::Uploaded,
                "File uploaded",
            );
        }

        return Ok(Json(UploadResponse {
            message: "File uploaded successfully".to_string(),
            filename: stored.filename,
            file_path: stored.path,
            size: stored.size,
            content_type,
        }));
    }

    Err(ApiError::BadRequest(
        "No file provided. Use multipart field 'file'.".to_string(),
    ))
}

fn executable_rejected(filename: &str, kind: &str) -> ApiError {
    warn!(filename, format = kind, "Rejected executable upload");
    ApiError::BadRequest(format!("Executable files are not allowed ({})", kind))
}

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub file_path: String,
    pub parser: Option<String>,
    pub parse_method: Option<String>,
    /// WebSocket client to receive `parsing_progress` messages.
    pub client_id: Option<String>,
}

/// Parse an uploaded document.
///
/// Responds with the facade envelope: 200 on success, 500 on failure.
#[utoipa::path(post, path = "/api/v1/documents/parse", tag = "Documents",
    responses(
        (status = 200, description = "Document parsed"),
        (status = 400, description = "Malformed request"),
        (status = 500, description = "Parsing failed"),
    ))]
pub async fn parse_document(
    State(state): State<AppState>,
    payload: Result<Json<ParseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<ParseOutcome>>), ApiError> {
    let Json(req) = payload?;
    if req.file_path.trim().is_empty() {
        return Err(ApiError::BadRequest("file_path is required".to_string()));
    }

    let filename = std::path::Path::new(&req.file_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| req.file_path.clone());
    let notify = |progress: u8, status: ProgressStatus, message: &str| {
        if let Some(ref client_id) = req.client_id {
            state
                .connections
                .send_progress(client_id, &filename, progress, status, message);
        }
    };

    notify(0, ProgressStatus::Processing, "Parsing started");
    let envelope = state
        .rag
        .parse_document(
            &req.file_path,
            req.parser.as_deref(),
            req.parse_method.as_deref(),
        )
        .await;

    let status = if envelope.success {
        let message = envelope
            .data
            .as_ref()
            .map(|d| d.message.as_str())
            .unwrap_or("Parsing complete");
        notify(100, ProgressStatus::Completed, message);
        StatusCode::OK
    } else {
        notify(
            0,
            ProgressStatus::Failed,
            envelope.error.as_deref().unwrap_or("Parsing failed"),
        );
        StatusCode::INTERNAL_SERVER_ERROR
    };

    Ok((status, Json(envelope)))
}

/// List uploaded documents.
///
/// Query: `skip` (default 0), `limit` (default 100), `status`
/// (`completed` | `processing`), `search` (case-insensitive substring).
#[utoipa::path(get, path = "/api/v1/documents/list", tag = "Documents",
    responses((status = 200, description = "Page of documents")))]
pub async fn list_documents(
    State(state): State<AppState>,
    Query(filter): Query<DocumentFilter>,
) -> Result<Json<DocumentPage>, ApiError> {
    Ok(Json(state.store.list(&filter).await?))
}

#[utoipa::path(get, path = "/api/v1/documents/{id}", tag = "Documents",
    params(("id" = String, Path, description = "Document id (the stored filename)")),
    responses(
        (status = 200, description = "Document detail"),
        (status = 404, description = "Document not found"),
    ))]
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DocumentDetail>, ApiError> {
    Ok(Json(state.store.get(&id).await?))
}

/// Delete a document and its parsed output.
///
/// Engine indices are not touched.
#[utoipa::path(delete, path = "/api/v1/documents/{id}", tag = "Documents",
    params(("id" = String, Path, description = "Document id (the stored filename)")),
    responses(
        (status = 200, description = "Document deleted"),
        (status = 404, description = "Document not found"),
    ))]
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = state.store.delete(&id).await?;
    Ok(Json(serde_json::json!({
        "message": "Document deleted successfully",
        "filename": deleted.filename,
        "deleted_file": deleted.deleted_file,
        "deleted_output": deleted.deleted_output,
    })))
}
