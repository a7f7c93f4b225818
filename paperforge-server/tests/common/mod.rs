//! Shared helpers for the server integration tests.
//!
//! Each test gets its own temp directory holding the blob store, scratch
//! directories and a shell script standing in for the generator.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header::CONTENT_TYPE};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use paperforge_server::config::Config;
use paperforge_server::generator::ProcessGenerator;
use paperforge_server::repository::InMemoryJobStore;
use paperforge_server::storage::FilesystemBlobStore;
use paperforge_server::{AppState, create_router};

pub const ALICE: &str = "123e4567-e89b-12d3-a456-426614174000";
pub const BOB: &str = "9b2f1c3e-5d4a-4f6b-8c7d-0e1f2a3b4c5d";

const BOUNDARY: &str = "paperforge-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub config: Config,
    pub store: Arc<InMemoryJobStore>,
    _dir: TempDir,
}

/// Build the router with `script` as the generator for both kinds.
pub async fn build_test_app(script: &str) -> TestApp {
    build_test_app_with(script, |_| {}).await
}

/// Like [`build_test_app`], with a hook to adjust the config.
pub async fn build_test_app_with(script: &str, configure: impl FnOnce(&mut Config)) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let script_path = dir.path().join("generate.sh");
    std::fs::write(&script_path, script).unwrap();

    let mut config = Config::new(dir.path());
    config.generator.interpreter = "sh".to_string();
    config.generator.slide_deck_script = script_path.clone();
    config.generator.podcast_script = script_path;
    configure(&mut config);

    let store = Arc::new(InMemoryJobStore::new());
    let blobs = FilesystemBlobStore::new(config.storage_dir.clone(), config.files_url())
        .await
        .unwrap();
    let generator = ProcessGenerator::new(config.generator.clone());

    let state = AppState::new(
        config.clone(),
        store.clone(),
        Arc::new(blobs),
        Arc::new(generator),
    );

    TestApp {
        router: create_router(state),
        config,
        store,
        _dir: dir,
    }
}

/// A `file` part for [`upload`]
pub struct FilePart<'a> {
    pub name: &'a str,
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

impl FilePart<'static> {
    pub fn pdf() -> Self {
        FilePart {
            name: "Attention Is All You Need.pdf",
            content_type: "application/pdf",
            bytes: b"%PDF-1.7\n%test document\n",
        }
    }
}

pub fn multipart_body(fields: &[(&str, &str)], file: Option<&FilePart<'_>>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(file) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file.name, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn upload(
    app: &TestApp,
    fields: &[(&str, &str)],
    file: Option<&FilePart<'_>>,
) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/upload")
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(fields, file)))
        .unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &TestApp, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn delete_json(app: &TestApp, uri: &str, json: Value) -> Response {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Submit a PDF and return the new generation id
pub async fn submit(app: &TestApp, output_type: &str, owner: &str, settings: &str) -> String {
    let response = upload(
        app,
        &[
            ("outputType", output_type),
            ("userId", owner),
            ("settings", settings),
        ],
        Some(&FilePart::pdf()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    json["generationId"].as_str().unwrap().to_string()
}

/// Poll the status endpoint until the record leaves `processing`.
pub async fn wait_for_terminal(app: &TestApp, id: &str, owner: &str) -> Value {
    let uri = format!("/api/generation/{id}?userId={owner}");
    for _ in 0..100 {
        let response = get(app, &uri).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        if json["status"] != "processing" {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("generation {id} did not finish in time");
}

/// Path part of a stored object's URL, for fetching it through the router
pub fn files_path(app: &TestApp, url: &str) -> String {
    let prefix = app.config.public_url.trim_end_matches('/');
    url.strip_prefix(prefix).unwrap().to_string()
}

/// Number of objects stored for an owner
pub fn stored_objects(app: &TestApp, owner: &str) -> usize {
    std::fs::read_dir(app.config.storage_dir.join(owner))
        .map(|entries| entries.count())
        .unwrap_or(0)
}
