#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, Request, StatusCode},
};
use chat_gateway::{AppState, Args, build_router};
use std::path::Path;
use std::sync::Arc;
use tower::util::ServiceExt;

pub const INDEX_HTML: &str = "<!doctype html><title>app</title>";

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Defaults with the public root pointed at `public_dir`.
pub fn test_args(public_dir: &Path) -> Args {
    Args {
        public_dir: public_dir.to_path_buf(),
        ..Args::default()
    }
}

/// A public root holding `index.html` and a couple of assets.
pub fn public_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    std::fs::write(dir.path().join("index.html"), INDEX_HTML).unwrap();
    std::fs::create_dir(dir.path().join("css")).unwrap();
    std::fs::write(dir.path().join("css/site.css"), "body{margin:0}").unwrap();
    std::fs::write(dir.path().join("data.json"), r#"{"a":1}"#).unwrap();
    dir
}

pub fn app(args: &Args) -> Router {
    let state = AppState::from_args(args).expect("valid test config");
    build_router(Arc::new(state))
}

pub async fn send(app: &Router, req: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    TestResponse { status, headers, body }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Serve `router` on an ephemeral local port, returning its base URL.
pub async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/v1")
}
