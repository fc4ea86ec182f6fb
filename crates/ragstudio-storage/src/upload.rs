//! Streaming upload writer with a size cap.

use std::path::PathBuf;

use ragstudio_core::defaults::UPLOAD_SNIFF_BYTES;
use ragstudio_core::{Error, Result, StoredUpload};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Writes an upload to a temporary `.part` file, then renames it into place.
///
/// Bytes are counted as they arrive; the first chunk that pushes the total
/// past the cap deletes the partial file and fails with
/// [`Error::PayloadTooLarge`]. A writer dropped without `commit` removes its
/// partial file.
pub struct UploadWriter {
    filename: String,
    final_path: PathBuf,
    temp_path: PathBuf,
    file: Option<fs::File>,
    written: u64,
    max_size: u64,
    head: Vec<u8>,
}

impl UploadWriter {
    pub(crate) async fn create(
        filename: String,
        final_path: PathBuf,
        temp_path: PathBuf,
        max_size: u64,
    ) -> Result<Self> {
        if let Some(parent) = temp_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "upload: create_dir_all failed");
                e
            })?;
        }
        let file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(temp_path = %temp_path.display(), error = %e, "upload: File::create failed");
            e
        })?;
        debug!(filename = %filename, temp_path = %temp_path.display(), "upload: started");

        Ok(Self {
            filename,
            final_path,
            temp_path,
            file: Some(file),
            written: 0,
            max_size,
            head: Vec::new(),
        })
    }

    /// Sanitized name the upload will be stored under.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Bytes accepted so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Leading bytes of the upload, up to `UPLOAD_SNIFF_BYTES`.
    pub fn head(&self) -> &[u8] {
        &self.head
    }

    /// Whether enough bytes have arrived to fill the sniff buffer.
    pub fn head_complete(&self) -> bool {
        self.head.len() >= UPLOAD_SNIFF_BYTES
    }

    /// Append a chunk, enforcing the size cap.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        let next = self.written + chunk.len() as u64;
        if next > self.max_size {
            warn!(
                filename = %self.filename,
                max_size = self.max_size,
                received = next,
                "upload: size cap exceeded"
            );
            self.discard().await;
            return Err(Error::PayloadTooLarge(format!(
                "File too large. Maximum size: {} bytes",
                self.max_size
            )));
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| Error::Internal("upload already finished".to_string()))?;
        file.write_all(chunk).await?;
        self.written = next;

        if self.head.len() < UPLOAD_SNIFF_BYTES {
            let take = (UPLOAD_SNIFF_BYTES - self.head.len()).min(chunk.len());
            self.head.extend_from_slice(&chunk[..take]);
        }
        Ok(())
    }

    /// Flush and atomically move the upload into place, replacing any
    /// existing file with the same name.
    pub async fn commit(mut self) -> Result<StoredUpload> {
        let mut file = self
            .file
            .take()
            .ok_or_else(|| Error::Internal("upload already finished".to_string()))?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&self.temp_path, &self.final_path)
            .await
            .map_err(|e| {
                warn!(
                    from = %self.temp_path.display(),
                    to = %self.final_path.display(),
                    error = %e,
                    "upload: rename failed"
                );
                e
            })?;

        // Uploaded documents are data, never executable
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.final_path, std::fs::Permissions::from_mode(0o644)).await?;
        }

        debug!(filename = %self.filename, size = self.written, "upload: committed");
        Ok(StoredUpload {
            filename: self.filename.clone(),
            path: self.final_path.display().to_string(),
            size: self.written,
        })
    }

    /// Drop the partial file without storing anything.
    pub async fn abort(mut self) {
        self.discard().await;
    }

    async fn discard(&mut self) {
        if self.file.take().is_some() {
            if let Err(e) = fs::remove_file(&self.temp_path).await {
                warn!(temp_path = %self.temp_path.display(), error = %e, "upload: cleanup failed");
            }
        }
    }
}

impl Drop for UploadWriter {
    fn drop(&mut self) {
        // Blocking remove; only reached when an upload is abandoned
        // mid-stream, and the partial file must be gone when drop returns.
        if self.file.take().is_some() {
            let _ = std::fs::remove_file(&self.temp_path);
        }
    }
}
