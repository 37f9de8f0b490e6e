//! Integration tests for the relay's HTTP routes.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{test_app, FakeProvider};
use parley_common::Config;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn create_test_app() -> axum::Router {
    test_app(&Config::default(), Arc::new(FakeProvider::new())).1
}

fn create_secured_app(token: &str) -> axum::Router {
    let mut config = Config::default();
    config.admin.token = Some(token.to_string());
    test_app(&config, Arc::new(FakeProvider::new())).1
}

/// Helper to make a JSON request, optionally with a bearer token.
async fn request_json(
    app: &axum::Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }

    let request = if let Some(b) = body {
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(&b).unwrap()))
            .unwrap()
    } else {
        builder.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    (status, json)
}

// ─────────────────────────────────────────────────────────────────────────────
// Health Check Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();

    let (status, json) = request_json(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "parley-relay");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_ready_check() {
    let app = create_test_app();

    let (status, json) = request_json(&app, Method::GET, "/ready", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ready");
    assert_eq!(json["active_sessions"], 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Admin Settings Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_settings_defaults() {
    let app = create_test_app();

    let (status, json) = request_json(&app, Method::GET, "/admin/settings", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["max_tokens"], 100);
    assert_eq!(json["data"]["active_sessions"], 0);
    assert!(json["data"]["system_prompt"]
        .as_str()
        .unwrap()
        .contains("snake plant"));
}

#[tokio::test]
async fn test_update_system_prompt() {
    let app = create_test_app();

    let (status, json) = request_json(
        &app,
        Method::PUT,
        "/admin/system-prompt",
        Some(json!({ "system_prompt": "You are a cactus." })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let (_, json) = request_json(&app, Method::GET, "/admin/settings", None, None).await;
    assert_eq!(json["data"]["system_prompt"], "You are a cactus.");
}

#[tokio::test]
async fn test_update_system_prompt_rejects_blank() {
    let app = create_test_app();

    let (status, json) = request_json(
        &app,
        Method::PUT,
        "/admin/system-prompt",
        Some(json!({ "system_prompt": "   " })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_update_max_tokens() {
    let app = create_test_app();

    let (status, _) = request_json(
        &app,
        Method::PUT,
        "/admin/max-tokens",
        Some(json!({ "max_tokens": 250 })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = request_json(&app, Method::GET, "/admin/settings", None, None).await;
    assert_eq!(json["data"]["max_tokens"], 250);
}

#[tokio::test]
async fn test_update_max_tokens_rejects_zero() {
    let app = create_test_app();

    let (status, json) = request_json(
        &app,
        Method::PUT,
        "/admin/max-tokens",
        Some(json!({ "max_tokens": 0 })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "INVALID_REQUEST");

    let (_, json) = request_json(&app, Method::GET, "/admin/settings", None, None).await;
    assert_eq!(json["data"]["max_tokens"], 100);
}

#[tokio::test]
async fn test_update_max_tokens_rejects_malformed_body() {
    let app = create_test_app();

    let (status, json) = request_json(
        &app,
        Method::PUT,
        "/admin/max-tokens",
        Some(json!({ "max_tokens": "lots" })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
}

// ─────────────────────────────────────────────────────────────────────────────
// Admin Auth Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_admin_requires_token_when_configured() {
    let app = create_secured_app("s3cret");

    let (status, json) = request_json(&app, Method::GET, "/admin/settings", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["code"], "UNAUTHORIZED");

    let (status, _) =
        request_json(&app, Method::GET, "/admin/settings", None, Some("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) =
        request_json(&app, Method::GET, "/admin/settings", None, Some("s3cret")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_is_open_when_token_configured() {
    let app = create_secured_app("s3cret");

    let (status, _) = request_json(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_rejected_update_does_not_apply() {
    let app = create_secured_app("s3cret");

    let (status, _) = request_json(
        &app,
        Method::PUT,
        "/admin/max-tokens",
        Some(json!({ "max_tokens": 5 })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, json) =
        request_json(&app, Method::GET, "/admin/settings", None, Some("s3cret")).await;
    assert_eq!(json["data"]["max_tokens"], 100);
}
