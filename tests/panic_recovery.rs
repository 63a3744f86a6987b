mod common;

use axum::{Router, http::StatusCode, routing::get};
use chat_gateway::{AppState, apply_gateway_layers};
use common::{get as get_request, public_dir, send, test_args};
use std::sync::Arc;

async fn explode() -> &'static str {
    panic!("handler blew up")
}

fn panicking_app() -> Router {
    let dir = public_dir();
    let state = Arc::new(AppState::from_args(&test_args(dir.path())).unwrap());
    let routes = Router::new().route("/boom", get(explode));
    apply_gateway_layers(routes, Arc::clone(&state)).with_state(state)
}

#[tokio::test]
async fn handler_panic_becomes_json_500_with_gateway_headers() {
    let app = panicking_app();

    let res = send(&app, get_request("/boom")).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);

    let json = res.json();
    assert_eq!(json["ok"], false);
    assert_eq!(json["error"], "server_error");
    assert!(json["detail"].as_str().unwrap().contains("handler blew up"));

    assert_eq!(res.headers["access-control-allow-origin"], "*");
    assert_eq!(res.headers["x-frame-options"], "DENY");
    assert_eq!(res.headers["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn router_keeps_serving_after_a_panic() {
    let app = panicking_app();

    assert_eq!(
        send(&app, get_request("/boom")).await.status,
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        send(&app, get_request("/boom")).await.status,
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
