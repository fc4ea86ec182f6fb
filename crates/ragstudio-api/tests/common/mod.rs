//! Shared harness: a real server on an ephemeral port backed by the mock
//! engine and a temporary output directory.

#![allow(dead_code)]

use std::sync::Arc;

use ragstudio_api::{build_router, AppState, Settings};
use ragstudio_engine::MockRagEngine;
use tempfile::TempDir;

/// Upload cap used by every test server.
pub const MAX_UPLOAD: u64 = 4096;

pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    pub engine: MockRagEngine,
    pub dir: TempDir,
}

impl TestServer {
    pub fn api(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    pub fn ws_url(&self, client_id: &str) -> String {
        format!(
            "{}/api/v1/ws/{}",
            self.base_url.replace("http://", "ws://"),
            client_id
        )
    }

    pub fn upload_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("uploads")
    }

    /// Files in the upload directory, excluding in-flight partials.
    pub fn stored_files(&self) -> Vec<String> {
        match std::fs::read_dir(self.upload_dir()) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

pub async fn spawn_server(engine: MockRagEngine) -> TestServer {
    let dir = TempDir::new().unwrap();
    let settings = Settings {
        output_dir: dir.path().to_path_buf(),
        max_upload_size: MAX_UPLOAD,
        rate_limit_enabled: false,
        ..Settings::default()
    };
    let state = AppState::new(settings, Arc::new(engine.clone()));
    state.store.ensure_dirs().await.unwrap();
    let router = build_router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    // Give server a moment to start
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    TestServer {
        base_url,
        state,
        engine,
        dir,
    }
}

/// POST a multipart upload with field `file`.
pub async fn upload(
    server: &TestServer,
    filename: &str,
    body: Vec<u8>,
    client_id: Option<&str>,
) -> reqwest::Response {
    let part = reqwest::multipart::Part::bytes(body).file_name(filename.to_string());
    let form = reqwest::multipart::Form::new().part("file", part);
    let mut url = server.api("/documents/upload");
    if let Some(id) = client_id {
        url = format!("{}?client_id={}", url, id);
    }
    reqwest::Client::new()
        .post(url)
        .multipart(form)
        .send()
        .await
        .unwrap()
}

pub fn pdf_bytes(len: usize) -> Vec<u8> {
    let mut body = b"%PDF-1.7\n".to_vec();
    body.resize(len.max(body.len()), b'a');
    body
}
