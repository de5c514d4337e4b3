//! Common test helpers for integration tests.
//!
//! Each test builds the full router over the in-memory backend and drives it
//! with `tower::ServiceExt::oneshot`.
//!
//! The `#![allow(dead_code)]` attribute is necessary because every file in
//! `tests/` is compiled as its own crate and uses a different subset of these
//! helpers.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use task_journal_api::api::{AppState, router};
use task_journal_api::infrastructure::{Repositories, TokenSigner};

pub const TEST_SECRET: &str = "integration-test-secret-0123456789";
pub const PASSWORD: &str = "correct-horse-battery";

// =============================================================================
// Application Helpers
// =============================================================================

/// Creates a router over fresh in-memory repositories.
pub fn create_test_app() -> Router {
    let signer = TokenSigner::new(
        TEST_SECRET,
        Duration::seconds(300),
        Duration::seconds(3600),
    );
    router(AppState::from_repositories(Repositories::in_memory(), signer))
}

/// A response with its body parsed as JSON (`Value::Null` when empty).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

/// Sends one request through the router.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn get(app: &Router, uri: &str, token: &str) -> TestResponse {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post(app: &Router, uri: &str, token: &str, body: Value) -> TestResponse {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn patch(app: &Router, uri: &str, token: &str, body: Value) -> TestResponse {
    send(app, Method::PATCH, uri, Some(token), Some(body)).await
}

pub async fn put(app: &Router, uri: &str, token: &str, body: Value) -> TestResponse {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete(app: &Router, uri: &str, token: &str) -> TestResponse {
    send(app, Method::DELETE, uri, Some(token), None).await
}

// =============================================================================
// Fixture Helpers
// =============================================================================

/// Registers `username` and returns its access token.
pub async fn register_user(app: &Router, username: &str) -> String {
    let response = send(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": PASSWORD,
            "password2": PASSWORD,
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.body["tokens"]["access"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Creates a task and returns its JSON representation.
pub async fn create_task(app: &Router, token: &str, body: Value) -> Value {
    let response = post(app, "/tasks", token, body).await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.body
}

/// Returns task ids from a list response in response order.
pub fn ids(list: &Value) -> Vec<i64> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|task| task["id"].as_i64().unwrap())
        .collect()
}

/// Returns the `details[].field` names of a validation error body.
pub fn error_fields(body: &Value) -> Vec<String> {
    body["details"]
        .as_array()
        .map(|details| {
            details
                .iter()
                .map(|detail| detail["field"].as_str().unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default()
}
