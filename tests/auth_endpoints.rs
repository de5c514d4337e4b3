//! Integration tests for registration, login, tokens and the health check.

mod common;

use axum::http::{Method, StatusCode};
use rstest::rstest;
use serde_json::json;

use common::{
    PASSWORD, create_task, create_test_app, delete, error_fields, get, ids, register_user, send,
};

#[rstest]
#[tokio::test]
async fn test_health_needs_no_token() {
    let app = create_test_app();

    let response = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
}

#[rstest]
#[tokio::test]
async fn test_register_returns_user_and_tokens() {
    let app = create_test_app();

    let response = send(
        &app,
        Method::POST,
        "/auth/register/",
        None,
        Some(json!({"username": "alice", "password": PASSWORD})),
    )
    .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["user"]["username"], "alice");
    assert!(response.body["user"].get("password_hash").is_none());
    assert!(response.body["tokens"]["access"].is_string());
    assert!(response.body["tokens"]["refresh"].is_string());
}

#[rstest]
#[tokio::test]
async fn test_register_rejects_duplicate_username() {
    let app = create_test_app();
    register_user(&app, "alice").await;

    let response = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({"username": "alice", "password": PASSWORD})),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&response.body), vec!["username".to_string()]);
}

#[rstest]
#[case(json!({"password": PASSWORD}), "username")]
#[case(json!({"username": "alice"}), "password")]
#[case(json!({"username": "alice", "password": "short"}), "password")]
#[case(json!({"username": "alice", "password": PASSWORD, "password2": "other-password"}), "password2")]
#[tokio::test]
async fn test_register_validation(#[case] body: serde_json::Value, #[case] field: &str) {
    let app = create_test_app();

    let response = send(&app, Method::POST, "/auth/register", None, Some(body)).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(error_fields(&response.body).contains(&field.to_string()));
}

#[rstest]
#[tokio::test]
async fn test_login_refresh_and_me() {
    let app = create_test_app();
    register_user(&app, "alice").await;

    let login = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"username": "alice", "password": PASSWORD})),
    )
    .await;
    assert_eq!(login.status, StatusCode::OK);
    let access = login.body["access"].as_str().unwrap().to_string();
    let refresh = login.body["refresh"].as_str().unwrap().to_string();

    let me = get(&app, "/auth/me", &access).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["username"], "alice");
    assert_eq!(me.body["email"], "alice@example.com");

    let refreshed = send(
        &app,
        Method::POST,
        "/auth/refresh",
        None,
        Some(json!({"refresh": refresh})),
    )
    .await;
    assert_eq!(refreshed.status, StatusCode::OK);
    let new_access = refreshed.body["access"].as_str().unwrap();
    assert_eq!(get(&app, "/auth/me", new_access).await.status, StatusCode::OK);

    // Refresh tokens are not accepted as bearer credentials.
    assert_eq!(
        get(&app, "/auth/me", &refresh).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[rstest]
#[case("alice", "wrong-password")]
#[case("nobody", PASSWORD)]
#[tokio::test]
async fn test_login_rejects_bad_credentials(#[case] username: &str, #[case] password: &str) {
    let app = create_test_app();
    register_user(&app, "alice").await;

    let response = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"username": username, "password": password})),
    )
    .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["code"], "UNAUTHORIZED");
}

#[rstest]
#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let app = create_test_app();
    let access = register_user(&app, "alice").await;

    let response = send(
        &app,
        Method::POST,
        "/auth/refresh",
        None,
        Some(json!({"refresh": access})),
    )
    .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[rstest]
#[tokio::test]
async fn test_delete_me_removes_account_and_tasks() {
    let app = create_test_app();
    let token = register_user(&app, "alice").await;
    create_task(&app, &token, json!({"text": "Pay rent #bills"})).await;

    let deleted = delete(&app, "/auth/me", &token).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    assert_eq!(
        get(&app, "/tasks", &token).await.status,
        StatusCode::UNAUTHORIZED
    );

    // The username is free again and the new account starts empty.
    let fresh = register_user(&app, "alice").await;
    assert!(ids(&get(&app, "/tasks", &fresh).await.body).is_empty());
}

#[rstest]
#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = create_test_app();
    let token = register_user(&app, "alice").await;

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/tasks")
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[rstest]
#[tokio::test]
async fn test_login_trims_username_like_registration() {
    let app = create_test_app();

    let registered = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({"username": " alice ", "password": PASSWORD})),
    )
    .await;
    assert_eq!(registered.status, StatusCode::CREATED);
    assert_eq!(registered.body["user"]["username"], "alice");

    for username in [" alice ", "alice"] {
        let login = send(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"username": username, "password": PASSWORD})),
        )
        .await;
        assert_eq!(login.status, StatusCode::OK, "login as {username:?}");
    }
}

#[rstest]
#[tokio::test]
async fn test_issued_tokens_are_three_part_jwts() {
    let app = create_test_app();
    register_user(&app, "alice").await;

    let login = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"username": "alice", "password": PASSWORD})),
    )
    .await;
    assert_eq!(login.status, StatusCode::OK);

    for field in ["access", "refresh"] {
        let token = login.body[field].as_str().unwrap();
        assert_eq!(token.split('.').count(), 3, "{field} token");
    }
}
