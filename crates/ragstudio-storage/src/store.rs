//! Document store over the upload and output directories.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use ragstudio_core::defaults::{
    CHUNK_ESTIMATE_CHARS, CONTENT_PREVIEW_CHARS, OUTPUT_MARKER_FILE, PARTIAL_SUBDIR,
    UPLOAD_SUBDIR,
};
use ragstudio_core::{
    content_type_for_extension, is_safe_document_id, sanitize_filename, DeletedDocument,
    DocumentDetail, DocumentFilter, DocumentPage, DocumentStatus, DocumentSummary, Error, Result,
};
use tokio::fs;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::upload::UploadWriter;

/// Filesystem-backed document store.
///
/// Path format:
/// - uploads: `{root}/uploads/{filename}`
/// - parsed output: `{root}/{stem}/enhanced_content.md`
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
    max_upload_size: u64,
}

impl DocumentStore {
    /// Create a store rooted at `root`. Directories are created lazily.
    pub fn new(root: impl Into<PathBuf>, max_upload_size: u64) -> Self {
        Self {
            root: root.into(),
            max_upload_size,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.root.join(UPLOAD_SUBDIR)
    }

    pub fn max_upload_size(&self) -> u64 {
        self.max_upload_size
    }

    /// Path of an uploaded document.
    pub fn upload_path(&self, filename: &str) -> PathBuf {
        self.upload_dir().join(filename)
    }

    /// Directory the engine writes parsed output into for `filename`.
    pub fn output_dir_for(&self, filename: &str) -> PathBuf {
        let stem = Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(filename);
        self.root.join(stem)
    }

    /// Reject names whose output directory would be the upload directory.
    pub fn check_document_name(&self, filename: &str) -> Result<()> {
        let stem = Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(filename);
        if stem.eq_ignore_ascii_case(UPLOAD_SUBDIR) {
            return Err(Error::InvalidInput(format!(
                "Document name '{}' is reserved",
                filename
            )));
        }
        Ok(())
    }

    fn marker_path(&self, filename: &str) -> PathBuf {
        self.output_dir_for(filename).join(OUTPUT_MARKER_FILE)
    }

    /// Create the upload directory if missing.
    pub async fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(self.upload_dir()).await?;
        Ok(())
    }

    /// List uploads, filtered, sorted newest first, then paginated.
    pub async fn list(&self, filter: &DocumentFilter) -> Result<DocumentPage> {
        let mut documents = Vec::new();

        let mut entries = match fs::read_dir(self.upload_dir()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(upload_dir = %self.upload_dir().display(), "store: upload dir missing");
                return Ok(DocumentPage {
                    documents,
                    total: 0,
                    skip: filter.skip,
                    limit: filter.limit,
                });
            }
            Err(e) => return Err(e.into()),
        };

        let search = filter.search.as_ref().map(|s| s.to_lowercase());
        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            let filename = entry.file_name().to_string_lossy().into_owned();
            if let Some(ref needle) = search {
                if !filename.to_lowercase().contains(needle) {
                    continue;
                }
            }
            let summary = self.summarize(&filename, &entry.path(), &meta).await?;
            if let Some(ref status) = filter.status {
                if summary.status.as_str() != status {
                    continue;
                }
            }
            trace!(filename = %filename, status = %summary.status, "store: listed");
            documents.push(summary);
        }

        documents.sort_by(|a, b| b.created.total_cmp(&a.created));
        let total = documents.len();
        let documents = documents
            .into_iter()
            .skip(filter.skip)
            .take(filter.limit)
            .collect();

        Ok(DocumentPage {
            documents,
            total,
            skip: filter.skip,
            limit: filter.limit,
        })
    }

    /// Fetch one document with a preview of its parsed output.
    pub async fn get(&self, id: &str) -> Result<DocumentDetail> {
        let path = self.resolve(id)?;
        let meta = match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Err(Error::NotFound(format!("Document {} not found", id))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(format!("Document {} not found", id)))
            }
            Err(e) => return Err(e.into()),
        };

        let summary = self.summarize(id, &path, &meta).await?;
        let marker = self.marker_path(id);
        let (content_preview, output_path) = match read_marker(&marker).await? {
            Some(content) => (
                Some(preview(&content)),
                Some(marker.display().to_string()),
            ),
            None => (None, None),
        };

        Ok(DocumentDetail {
            summary,
            content_preview,
            output_path,
        })
    }

    /// Remove an upload and its output directory.
    ///
    /// Engine indices are left untouched; their entries for this document
    /// become orphans.
    pub async fn delete(&self, id: &str) -> Result<DeletedDocument> {
        let path = self.resolve(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(format!("Document {} not found", id)))
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "store: remove_file failed");
                return Err(e.into());
            }
        }

        let output_dir = self.output_dir_for(id);
        let deleted_output = if output_dir != self.upload_dir()
            && fs::metadata(&output_dir)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false)
        {
            fs::remove_dir_all(&output_dir).await.map_err(|e| {
                warn!(output_dir = %output_dir.display(), error = %e, "store: remove_dir_all failed");
                e
            })?;
            Some(output_dir.display().to_string())
        } else {
            None
        };

        info!(filename = %id, output_removed = deleted_output.is_some(), "Document deleted");
        Ok(DeletedDocument {
            filename: id.to_string(),
            deleted_file: path.display().to_string(),
            deleted_output,
        })
    }

    /// Start a streaming upload. The name is sanitized first.
    pub async fn begin_upload(&self, filename: &str) -> Result<UploadWriter> {
        let filename = sanitize_filename(filename);
        self.check_document_name(&filename)?;
        let upload_dir = self.upload_dir();
        let temp_path = upload_dir
            .join(PARTIAL_SUBDIR)
            .join(format!("{}.part", Uuid::now_v7()));
        UploadWriter::create(
            filename.clone(),
            upload_dir.join(&filename),
            temp_path,
            self.max_upload_size,
        )
        .await
    }

    fn resolve(&self, id: &str) -> Result<PathBuf> {
        if !is_safe_document_id(id) {
            return Err(Error::InvalidInput(format!("Invalid document id: {}", id)));
        }
        self.check_document_name(id)?;
        Ok(self.upload_path(id))
    }

    async fn summarize(
        &self,
        filename: &str,
        path: &Path,
        meta: &std::fs::Metadata,
    ) -> Result<DocumentSummary> {
        let created = meta
            .created()
            .or_else(|_| meta.modified())
            .map(unix_seconds)
            .unwrap_or(0.0);
        let modified = meta.modified().map(unix_seconds).unwrap_or(created);

        let (status, chunks, entities) = match read_marker(&self.marker_path(filename)).await? {
            Some(content) => {
                let (chunks, entities) = estimate_counts(&content);
                (DocumentStatus::Completed, chunks, entities)
            }
            None => (DocumentStatus::Processing, None, None),
        };

        let content_type = content_type_for_extension(filename).to_string();
        Ok(DocumentSummary {
            id: filename.to_string(),
            filename: filename.to_string(),
            path: path.display().to_string(),
            size: meta.len(),
            kind: content_type.clone(),
            content_type,
            status,
            uploaded_at: created,
            created,
            modified,
            chunks,
            entities,
        })
    }
}

async fn read_marker(marker: &Path) -> Result<Option<String>> {
    match fs::read(marker).await {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Approximate chunk and entity counts from parsed markdown.
///
/// These are not engine metadata: chunks assume a fixed characters-per-chunk
/// ratio and entities count heading and bold markers. Zero becomes `None`.
fn estimate_counts(content: &str) -> (Option<usize>, Option<usize>) {
    let chunks = (content.chars().count() / CHUNK_ESTIMATE_CHARS).max(1);
    let entities = content.matches("##").count() + content.matches("**").count();
    (Some(chunks), (entities > 0).then_some(entities))
}

fn preview(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(CONTENT_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

fn unix_seconds(t: SystemTime) -> f64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_counts() {
        let content = "## Intro\n**bold** text\n### Sub";
        let (chunks, entities) = estimate_counts(content);
        assert_eq!(chunks, Some(1));
        assert_eq!(entities, Some(4));
    }

    #[test]
    fn test_estimate_counts_large_document() {
        let content = "x".repeat(1_250);
        let (chunks, entities) = estimate_counts(&content);
        assert_eq!(chunks, Some(2));
        assert_eq!(entities, None);
    }

    #[test]
    fn test_preview_truncates_with_ellipsis() {
        let long = "a".repeat(600);
        let p = preview(&long);
        assert_eq!(p.len(), 503);
        assert!(p.ends_with("..."));
        assert_eq!(preview("short"), "short");
        assert_eq!(preview(&"b".repeat(500)), "b".repeat(500));
    }

    #[test]
    fn test_output_dir_uses_stem() {
        let store = DocumentStore::new("/data/out", 10);
        assert_eq!(store.output_dir_for("paper.pdf"), PathBuf::from("/data/out/paper"));
        assert_eq!(
            store.upload_path("paper.pdf"),
            PathBuf::from("/data/out/uploads/paper.pdf")
        );
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let store = DocumentStore::new("/data/out", 10);
        assert!(matches!(
            store.resolve("../secret.pdf"),
            Err(Error::InvalidInput(_))
        ));
        assert!(store.resolve("ok.pdf").is_ok());
    }

    #[test]
    fn test_upload_dir_stem_is_reserved() {
        let store = DocumentStore::new("/data/out", 10);
        for name in ["uploads.pdf", "UPLOADS.docx", "uploads"] {
            assert!(
                matches!(store.check_document_name(name), Err(Error::InvalidInput(_))),
                "{} should be reserved",
                name
            );
            assert!(matches!(store.resolve(name), Err(Error::InvalidInput(_))));
        }
        assert!(store.check_document_name("uploads-2024.pdf").is_ok());
        assert!(store.check_document_name("my_uploads.pdf").is_ok());
    }
}
