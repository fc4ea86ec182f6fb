//! Document endpoints exercised over HTTP against the mock engine.

mod common;

use common::{pdf_bytes, spawn_server, upload, MAX_UPLOAD};
use ragstudio_engine::MockRagEngine;
use serde_json::Value;

#[tokio::test]
async fn test_upload_stores_file_and_reports_sniffed_type() {
    let server = spawn_server(MockRagEngine::new()).await;

    let resp = upload(&server, "report.pdf", pdf_bytes(256), None).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "File uploaded successfully");
    assert_eq!(body["filename"], "report.pdf");
    assert_eq!(body["size"], 256);
    assert_eq!(body["type"], "application/pdf");
    assert!(body["file_path"].as_str().unwrap().ends_with("report.pdf"));

    assert_eq!(server.stored_files(), vec!["report.pdf".to_string()]);
}

#[tokio::test]
async fn test_upload_disallowed_extension_writes_nothing() {
    let server = spawn_server(MockRagEngine::new()).await;

    let resp = upload(&server, "script.sh", b"#!/bin/sh\necho hi\n".to_vec(), None).await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains(".sh"));

    assert!(server.stored_files().is_empty());
    let partial = server.upload_dir().join(".partial");
    let leftovers = std::fs::read_dir(&partial).map(|d| d.count()).unwrap_or(0);
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn test_upload_oversized_is_413_and_leaves_nothing() {
    let server = spawn_server(MockRagEngine::new()).await;

    let resp = upload(
        &server,
        "huge.pdf",
        pdf_bytes(MAX_UPLOAD as usize + 1),
        None,
    )
    .await;
    assert_eq!(resp.status(), 413);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("File too large"));

    assert!(server.stored_files().is_empty());
    let partial = server.upload_dir().join(".partial");
    let leftovers = std::fs::read_dir(&partial).map(|d| d.count()).unwrap_or(0);
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn test_upload_far_over_cap_gets_json_413() {
    let server = spawn_server(MockRagEngine::new()).await;

    // Larger than the cap plus multipart overhead, so the body limit layer
    // answers before the handler streams anything.
    let resp = upload(&server, "giant.pdf", pdf_bytes(200 * 1024), None).await;
    assert_eq!(resp.status(), 413);
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("application/json"), "{}", content_type);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["error"],
        format!("File too large. Maximum size: {} bytes", MAX_UPLOAD)
    );

    assert!(server.stored_files().is_empty());
}

#[tokio::test]
async fn test_upload_executable_is_rejected() {
    let server = spawn_server(MockRagEngine::new()).await;

    let mut body = vec![0x4D, 0x5A, 0x90, 0x00];
    body.resize(128, 0);
    let resp = upload(&server, "invoice.pdf", body, None).await;
    assert_eq!(resp.status(), 400);
    let json: Value = resp.json().await.unwrap();
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("Executable files are not allowed"));
    assert!(server.stored_files().is_empty());
}

#[tokio::test]
async fn test_upload_without_file_field_is_400() {
    let server = spawn_server(MockRagEngine::new()).await;

    let form = reqwest::multipart::Form::new().text("note", "no file here");
    let resp = reqwest::Client::new()
        .post(server.api("/documents/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_parse_then_list_completed() {
    let server = spawn_server(MockRagEngine::new()).await;
    let client = reqwest::Client::new();

    let uploaded: Value = upload(&server, "parsed.pdf", pdf_bytes(64), None)
        .await
        .json()
        .await
        .unwrap();
    upload(&server, "pending.pdf", pdf_bytes(64), None).await;

    let resp = client
        .post(server.api("/documents/parse"))
        .json(&serde_json::json!({ "file_path": uploaded["file_path"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let envelope: Value = resp.json().await.unwrap();
    assert_eq!(envelope["success"], true);
    assert_eq!(envelope["parser"], "mineru");
    assert_eq!(server.engine.call_count("parse_document"), 1);

    let page: Value = client
        .get(server.api("/documents/list?status=completed"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["total"], 1);
    assert_eq!(page["documents"][0]["filename"], "parsed.pdf");
    assert_eq!(page["documents"][0]["status"], "completed");

    let all: Value = client
        .get(server.api("/documents/list"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all["total"], 2);
}

#[tokio::test]
async fn test_parse_failure_returns_500_envelope() {
    let server = spawn_server(MockRagEngine::new().with_failure("parser crashed")).await;

    let resp = reqwest::Client::new()
        .post(server.api("/documents/parse"))
        .json(&serde_json::json!({ "file_path": "/tmp/missing.pdf" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let envelope: Value = resp.json().await.unwrap();
    assert_eq!(envelope["success"], false);
    assert!(envelope["error"].as_str().unwrap().contains("parser crashed"));
    assert!(envelope["message"]
        .as_str()
        .unwrap()
        .starts_with("Parsing failed"));
    assert_eq!(envelope["file_path"], "/tmp/missing.pdf");
}

#[tokio::test]
async fn test_parse_malformed_body_is_400() {
    let server = spawn_server(MockRagEngine::new()).await;

    let resp = reqwest::Client::new()
        .post(server.api("/documents/parse"))
        .json(&serde_json::json!({ "parser": "mineru" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_get_document_with_preview() {
    let server = spawn_server(MockRagEngine::new()).await;
    let client = reqwest::Client::new();

    let uploaded: Value = upload(&server, "notes.pdf", pdf_bytes(64), None)
        .await
        .json()
        .await
        .unwrap();
    client
        .post(server.api("/documents/parse"))
        .json(&serde_json::json!({ "file_path": uploaded["file_path"] }))
        .send()
        .await
        .unwrap();

    let detail: Value = client
        .get(server.api("/documents/notes.pdf"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["id"], "notes.pdf");
    assert_eq!(detail["status"], "completed");
    assert!(detail["content_preview"]
        .as_str()
        .unwrap()
        .contains("notes.pdf"));
    assert!(detail["output_path"].is_string());
}

#[tokio::test]
async fn test_get_missing_document_is_404() {
    let server = spawn_server(MockRagEngine::new()).await;

    let resp = reqwest::Client::new()
        .get(server.api("/documents/nope.pdf"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_delete_twice_second_is_404() {
    let server = spawn_server(MockRagEngine::new()).await;
    let client = reqwest::Client::new();

    let uploaded: Value = upload(&server, "gone.pdf", pdf_bytes(64), None)
        .await
        .json()
        .await
        .unwrap();
    client
        .post(server.api("/documents/parse"))
        .json(&serde_json::json!({ "file_path": uploaded["file_path"] }))
        .send()
        .await
        .unwrap();
    assert!(server.dir.path().join("gone").is_dir());

    let resp = client
        .delete(server.api("/documents/gone.pdf"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Document deleted successfully");
    assert_eq!(body["filename"], "gone.pdf");
    assert!(body["deleted_output"].is_string());
    assert!(!server.dir.path().join("gone").exists());
    assert!(server.stored_files().is_empty());

    let again = client
        .delete(server.api("/documents/gone.pdf"))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), 404);
}
