mod common;

use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use chat_gateway::Args;
use common::{app, post_json, public_dir, send, test_args};
use futures_util::stream::{self, StreamExt};
use std::time::Duration;

#[tokio::test]
async fn echo_reply_contains_the_message() {
    let dir = public_dir();
    let app = app(&test_args(dir.path()));

    let res = send(&app, post_json("/api/chat", r#"{"message":"hello"}"#)).await;
    assert_eq!(res.status, StatusCode::OK);

    let json = res.json();
    assert_eq!(json["ok"], true);
    assert_eq!(json["mode"], "echo");
    assert!(json["reply"].as_str().unwrap().contains("hello"));
}

#[tokio::test]
async fn blank_message_is_rejected_regardless_of_system() {
    let dir = public_dir();
    let app = app(&test_args(dir.path()));

    for body in [
        r#"{"message":""}"#,
        r#"{"message":"   "}"#,
        r#"{"message":" \t\n","system":"you are terse"}"#,
        r#"{"system":"you are terse"}"#,
        "",
    ] {
        let res = send(&app, post_json("/api/chat", body)).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "body {body:?}");
        assert_eq!(res.json()["error"], "missing_message");
        assert_eq!(res.json()["ok"], false);
    }
}

#[tokio::test]
async fn malformed_json_is_invalid_json() {
    let dir = public_dir();
    let app = app(&test_args(dir.path()));

    let res = send(&app, post_json("/api/chat", r#"{"message": "hi""#)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "invalid_json");
}

#[tokio::test]
async fn declared_oversized_body_is_413() {
    let dir = public_dir();
    let args = Args {
        max_body_bytes: 64,
        ..test_args(dir.path())
    };
    let app = app(&args);

    let body = format!(r#"{{"message":"{}"}}"#, "x".repeat(200));
    let req = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("Content-Type", "application/json")
        .header("Content-Length", body.len())
        .body(Body::from(body))
        .unwrap();
    let res = send(&app, req).await;
    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(res.json()["error"], "body_too_large");
    assert_eq!(res.headers["connection"], "close");
}

#[tokio::test]
async fn streamed_oversized_body_aborts_without_reading_the_rest() {
    let dir = public_dir();
    let args = Args {
        max_body_bytes: 1024,
        ..test_args(dir.path())
    };
    let app = app(&args);

    // Two chunks over the limit, then a stream that never ends
    let chunks = stream::iter(vec![
        Ok::<_, std::io::Error>(Bytes::from(vec![b'a'; 800])),
        Ok(Bytes::from(vec![b'b'; 800])),
    ])
    .chain(stream::pending());
    let req = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .body(Body::from_stream(chunks))
        .unwrap();

    let res = tokio::time::timeout(Duration::from_secs(5), send(&app, req))
        .await
        .expect("oversized body must not wait for the rest of the stream");
    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(res.json()["error"], "body_too_large");
}

#[tokio::test]
async fn rate_limit_rejects_after_ceiling() {
    let dir = public_dir();
    let args = Args {
        rate_limit: 3,
        rate_window: 60,
        ..test_args(dir.path())
    };
    let app = app(&args);

    let chat = |ip: &str| {
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("x-forwarded-for", ip)
            .body(Body::from(r#"{"message":"hi"}"#))
            .unwrap()
    };

    let mut statuses = Vec::new();
    for _ in 0..4 {
        statuses.push(send(&app, chat("198.51.100.1")).await.status);
    }
    assert_eq!(
        statuses,
        vec![StatusCode::OK, StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
    );

    let limited = send(&app, chat("198.51.100.1")).await;
    assert_eq!(limited.json()["error"], "rate_limited");
    assert_eq!(limited.headers["retry-after"], "60");

    // another client is unaffected
    assert_eq!(send(&app, chat("198.51.100.2")).await.status, StatusCode::OK);
}

#[tokio::test]
async fn rate_limit_is_checked_before_body_validation() {
    let dir = public_dir();
    let args = Args {
        rate_limit: 1,
        ..test_args(dir.path())
    };
    let app = app(&args);

    assert_eq!(send(&app, post_json("/api/chat", "{bad")).await.status, StatusCode::BAD_REQUEST);
    let res = send(&app, post_json("/api/chat", "{bad")).await;
    assert_eq!(res.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn chat_token_gates_the_endpoint() {
    let dir = public_dir();
    let args = Args {
        chat_token: Some("letmein".to_string()),
        ..test_args(dir.path())
    };
    let app = app(&args);

    let res = send(&app, post_json("/api/chat", r#"{"message":"hi"}"#)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["error"], "unauthorized");
    assert_eq!(res.headers["www-authenticate"], "Bearer");

    let wrong = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("Authorization", "Bearer nope")
        .body(Body::from(r#"{"message":"hi"}"#))
        .unwrap();
    assert_eq!(send(&app, wrong).await.status, StatusCode::UNAUTHORIZED);

    let right = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("Authorization", "Bearer letmein")
        .body(Body::from(r#"{"message":"hi"}"#))
        .unwrap();
    let res = send(&app, right).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["mode"], "echo");
}

#[tokio::test]
async fn get_on_chat_path_falls_through_to_static() {
    let dir = public_dir();
    let app = app(&test_args(dir.path()));

    let res = send(&app, common::get("/api/chat")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.text(), common::INDEX_HTML);
}
