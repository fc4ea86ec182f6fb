//! Integration tests for the filesystem document store.

use std::time::Duration;

use ragstudio_core::{DocumentFilter, DocumentStatus, Error};
use ragstudio_storage::DocumentStore;
use tempfile::TempDir;

const MAX: u64 = 1024;

async fn upload(store: &DocumentStore, name: &str, body: &[u8]) {
    let mut writer = store.begin_upload(name).await.unwrap();
    writer.write_chunk(body).await.unwrap();
    writer.commit().await.unwrap();
}

fn mark_parsed(dir: &TempDir, stem: &str, content: &str) {
    let out = dir.path().join(stem);
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join("enhanced_content.md"), content).unwrap();
}

fn filter() -> DocumentFilter {
    DocumentFilter {
        skip: 0,
        limit: 100,
        status: None,
        search: None,
    }
}

#[tokio::test]
async fn test_list_missing_upload_dir_is_empty() {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::new(dir.path().join("never-created"), MAX);

    let page = store.list(&filter()).await.unwrap();
    assert_eq!(page.total, 0);
    assert!(page.documents.is_empty());
}

#[tokio::test]
async fn test_status_filter_follows_marker_file() {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::new(dir.path(), MAX);
    upload(&store, "done.pdf", b"%PDF-1.7").await;
    upload(&store, "pending.pdf", b"%PDF-1.7").await;
    mark_parsed(&dir, "done", "## Heading\nbody");

    let completed = store
        .list(&DocumentFilter {
            status: Some("completed".to_string()),
            ..filter()
        })
        .await
        .unwrap();
    assert_eq!(completed.total, 1);
    assert_eq!(completed.documents[0].filename, "done.pdf");
    assert_eq!(completed.documents[0].status, DocumentStatus::Completed);
    assert_eq!(completed.documents[0].chunks, Some(1));
    assert_eq!(completed.documents[0].entities, Some(1));

    let processing = store
        .list(&DocumentFilter {
            status: Some("processing".to_string()),
            ..filter()
        })
        .await
        .unwrap();
    assert_eq!(processing.total, 1);
    assert_eq!(processing.documents[0].filename, "pending.pdf");
    assert_eq!(processing.documents[0].chunks, None);

    let unknown = store
        .list(&DocumentFilter {
            status: Some("archived".to_string()),
            ..filter()
        })
        .await
        .unwrap();
    assert_eq!(unknown.total, 0);
}

#[tokio::test]
async fn test_search_sort_and_pagination() {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::new(dir.path(), MAX);
    for name in ["Alpha-report.pdf", "beta-notes.md", "gamma-REPORT.txt"] {
        upload(&store, name, b"content").await;
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let reports = store
        .list(&DocumentFilter {
            search: Some("report".to_string()),
            ..filter()
        })
        .await
        .unwrap();
    assert_eq!(reports.total, 2);
    assert_eq!(reports.documents[0].filename, "gamma-REPORT.txt");
    assert_eq!(reports.documents[1].filename, "Alpha-report.pdf");

    let page = store
        .list(&DocumentFilter {
            skip: 1,
            limit: 1,
            ..filter()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.documents.len(), 1);
    assert_eq!(page.documents[0].filename, "beta-notes.md");
}

#[tokio::test]
async fn test_list_ignores_partial_uploads() {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::new(dir.path(), MAX);
    let mut inflight = store.begin_upload("inflight.pdf").await.unwrap();
    inflight.write_chunk(b"partial").await.unwrap();

    let page = store.list(&filter()).await.unwrap();
    assert_eq!(page.total, 0);
    inflight.abort().await;
}

#[tokio::test]
async fn test_get_includes_preview_and_content_type() {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::new(dir.path(), MAX);
    upload(&store, "paper.docx", b"PK\x03\x04").await;
    mark_parsed(&dir, "paper", &"z".repeat(700));

    let detail = store.get("paper.docx").await.unwrap();
    assert_eq!(
        detail.summary.content_type,
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    );
    assert_eq!(detail.summary.size, 4);
    let preview = detail.content_preview.unwrap();
    assert!(preview.ends_with("..."));
    assert_eq!(preview.len(), 503);
    assert!(detail.output_path.unwrap().ends_with("enhanced_content.md"));
}

#[tokio::test]
async fn test_get_unparsed_has_no_preview() {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::new(dir.path(), MAX);
    upload(&store, "raw.png", b"\x89PNG").await;

    let detail = store.get("raw.png").await.unwrap();
    assert_eq!(detail.summary.status, DocumentStatus::Processing);
    assert!(detail.content_preview.is_none());
    assert!(detail.output_path.is_none());

    let json = serde_json::to_value(&detail).unwrap();
    assert_eq!(json["type"], "image/png");
}

#[tokio::test]
async fn test_get_missing_is_not_found() {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::new(dir.path(), MAX);
    assert!(matches!(store.get("ghost.pdf").await, Err(Error::NotFound(_))));
    assert!(matches!(store.get("../etc").await, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn test_delete_removes_upload_and_output() {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::new(dir.path(), MAX);
    upload(&store, "doc.md", b"# doc").await;
    mark_parsed(&dir, "doc", "parsed");

    let deleted = store.delete("doc.md").await.unwrap();
    assert_eq!(deleted.filename, "doc.md");
    assert!(deleted.deleted_output.is_some());
    assert!(!dir.path().join("uploads/doc.md").exists());
    assert!(!dir.path().join("doc").exists());

    assert!(matches!(store.delete("doc.md").await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_delete_without_output_reports_none() {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::new(dir.path(), MAX);
    upload(&store, "lonely.txt", b"text").await;

    let deleted = store.delete("lonely.txt").await.unwrap();
    assert!(deleted.deleted_output.is_none());
}

#[tokio::test]
async fn test_upload_overwrites_and_sanitizes() {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::new(dir.path(), MAX);
    upload(&store, "../../same.txt", b"first").await;
    upload(&store, "same.txt", b"second!").await;

    let page = store.list(&filter()).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.documents[0].filename, "same.txt");
    assert_eq!(page.documents[0].size, 7);
}

#[tokio::test]
async fn test_oversized_upload_leaves_nothing() {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::new(dir.path(), 10);
    let mut writer = store.begin_upload("big.pdf").await.unwrap();
    let err = writer.write_chunk(&[0u8; 11]).await.unwrap_err();
    assert!(matches!(err, Error::PayloadTooLarge(_)));
    drop(writer);

    assert!(!dir.path().join("uploads/big.pdf").exists());
    let partials: Vec<_> = std::fs::read_dir(dir.path().join("uploads/.partial"))
        .unwrap()
        .collect();
    assert!(partials.is_empty());
}

#[tokio::test]
async fn test_upload_dir_stem_cannot_clobber_other_documents() {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::new(dir.path(), MAX);
    upload(&store, "a.pdf", b"%PDF-a").await;
    upload(&store, "b.pdf", b"%PDF-b").await;

    let err = store.begin_upload("uploads.pdf").await.err().unwrap();
    assert!(matches!(err, Error::InvalidInput(_)));

    // A file with the reserved stem placed on disk by other means.
    std::fs::write(dir.path().join("uploads/uploads.pdf"), b"%PDF-x").unwrap();
    let err = store.delete("uploads.pdf").await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    assert!(store.get("a.pdf").await.is_ok());
    assert!(store.get("b.pdf").await.is_ok());
    assert!(dir.path().join("uploads").is_dir());
}
