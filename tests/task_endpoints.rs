//! Integration tests for the task endpoints.

mod common;

use axum::http::{Method, StatusCode, header};
use rstest::rstest;
use serde_json::json;

use common::{
    create_task, create_test_app, delete, error_fields, get, ids, patch, post, put, register_user,
    send,
};

// =============================================================================
// Create and Tag Parsing
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_create_extracts_hashtag_and_appends_order() {
    let app = create_test_app();
    let token = register_user(&app, "alice").await;

    let first = create_task(&app, &token, json!({"text": "Pay rent #bills"})).await;
    assert_eq!(first["text"], "Pay rent");
    assert_eq!(first["tag"], "bills");
    assert_eq!(first["done"], false);
    assert_eq!(first["order"], 0);
    assert!(first["scheduled_for"].is_null());

    let second = create_task(&app, &token, json!({"text": "Water plants"})).await;
    assert_eq!(second["order"], 1);
    assert!(second["tag"].is_null());

    let fetched = get(&app, &format!("/tasks/{}", first["id"]), &token).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["text"], "Pay rent");
    assert_eq!(fetched.body["tag"], "bills");
}

#[rstest]
#[tokio::test]
async fn test_create_explicit_tag_overrides_inferred() {
    let app = create_test_app();
    let token = register_user(&app, "alice").await;

    let task = create_task(
        &app,
        &token,
        json!({"text": "Walk dog #pets", "tag": "errand"}),
    )
    .await;

    assert_eq!(task["text"], "Walk dog");
    assert_eq!(task["tag"], "errand");
}

#[rstest]
#[case(json!({"text": "#only"}), "text")]
#[case(json!({"text": "   "}), "text")]
#[case(json!({}), "text")]
#[case(json!({"text": "x".repeat(501)}), "text")]
#[case(json!({"text": "ok", "tag": "t".repeat(51)}), "tag")]
#[case(json!({"text": "ok", "scheduled_for": "next week"}), "scheduled_for")]
#[tokio::test]
async fn test_create_rejects_invalid_input(
    #[case] body: serde_json::Value,
    #[case] field: &str,
) {
    let app = create_test_app();
    let token = register_user(&app, "alice").await;

    let response = post(&app, "/tasks", &token, body).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "VALIDATION_ERROR");
    assert!(error_fields(&response.body).contains(&field.to_string()));
}

// =============================================================================
// List and Filters
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_list_filters_by_tag_and_date() {
    let app = create_test_app();
    let token = register_user(&app, "alice").await;

    let rent = create_task(
        &app,
        &token,
        json!({"text": "Pay rent #bills", "scheduled_for": "2024-03-01"}),
    )
    .await;
    let power = create_task(&app, &token, json!({"text": "Pay power #Bills"})).await;
    create_task(
        &app,
        &token,
        json!({"text": "Walk dog", "scheduled_for": "2024-03-01"}),
    )
    .await;

    let by_tag = get(&app, "/tasks?tag=bills", &token).await;
    assert_eq!(by_tag.status, StatusCode::OK);
    assert_eq!(
        ids(&by_tag.body),
        vec![rent["id"].as_i64().unwrap(), power["id"].as_i64().unwrap()]
    );

    let by_both = get(&app, "/tasks?tag=bills&scheduled_for=2024-03-01", &token).await;
    assert_eq!(ids(&by_both.body), vec![rent["id"].as_i64().unwrap()]);

    let unfiltered = get(&app, "/tasks?tag=&scheduled_for=", &token).await;
    assert_eq!(ids(&unfiltered.body).len(), 3);

    let bad_date = get(&app, "/tasks?scheduled_for=03/01/2024", &token).await;
    assert_eq!(bad_date.status, StatusCode::BAD_REQUEST);
}

#[rstest]
#[tokio::test]
async fn test_trailing_slash_is_accepted() {
    let app = create_test_app();
    let token = register_user(&app, "alice").await;
    let task = create_task(&app, &token, json!({"text": "Slash"})).await;

    let list = get(&app, "/tasks/", &token).await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(ids(&list.body), vec![task["id"].as_i64().unwrap()]);

    let item = get(&app, &format!("/tasks/{}/", task["id"]), &token).await;
    assert_eq!(item.status, StatusCode::OK);
}

// =============================================================================
// Update
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_patch_follows_tag_precedence() {
    let app = create_test_app();
    let token = register_user(&app, "alice").await;
    let task = create_task(&app, &token, json!({"text": "Pay rent #bills"})).await;
    let uri = format!("/tasks/{}", task["id"]);

    let retagged = patch(&app, &uri, &token, json!({"text": "Buy milk #groceries"})).await;
    assert_eq!(retagged.status, StatusCode::OK);
    assert_eq!(retagged.body["text"], "Buy milk");
    assert_eq!(retagged.body["tag"], "groceries");

    let kept = patch(&app, &uri, &token, json!({"text": "Buy oat milk"})).await;
    assert_eq!(kept.body["text"], "Buy oat milk");
    assert_eq!(kept.body["tag"], "groceries");

    let done = patch(&app, &uri, &token, json!({"done": true})).await;
    assert_eq!(done.body["done"], true);
    assert_eq!(done.body["text"], "Buy oat milk");

    let cleared = patch(&app, &uri, &token, json!({"tag": null})).await;
    assert!(cleared.body["tag"].is_null());
    assert_eq!(cleared.body["order"], task["order"]);
}

#[rstest]
#[tokio::test]
async fn test_patch_clears_scheduled_for_with_null() {
    let app = create_test_app();
    let token = register_user(&app, "alice").await;
    let task = create_task(
        &app,
        &token,
        json!({"text": "Dentist", "scheduled_for": "2024-05-02"}),
    )
    .await;
    assert_eq!(task["scheduled_for"], "2024-05-02");

    let uri = format!("/tasks/{}", task["id"]);
    let cleared = patch(&app, &uri, &token, json!({"scheduled_for": null})).await;
    assert!(cleared.body["scheduled_for"].is_null());
}

#[rstest]
#[tokio::test]
async fn test_put_requires_text() {
    let app = create_test_app();
    let token = register_user(&app, "alice").await;
    let task = create_task(&app, &token, json!({"text": "Original"})).await;
    let uri = format!("/tasks/{}", task["id"]);

    let missing = put(&app, &uri, &token, json!({"done": true})).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&missing.body), vec!["text".to_string()]);

    let replaced = put(&app, &uri, &token, json!({"text": "Replaced #new", "done": true})).await;
    assert_eq!(replaced.status, StatusCode::OK);
    assert_eq!(replaced.body["text"], "Replaced");
    assert_eq!(replaced.body["tag"], "new");
    assert_eq!(replaced.body["done"], true);
}

#[rstest]
#[tokio::test]
async fn test_delete_removes_task() {
    let app = create_test_app();
    let token = register_user(&app, "alice").await;
    let task = create_task(&app, &token, json!({"text": "Temporary"})).await;
    let uri = format!("/tasks/{}", task["id"]);

    let deleted = delete(&app, &uri, &token).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    assert_eq!(get(&app, &uri, &token).await.status, StatusCode::NOT_FOUND);
    assert_eq!(delete(&app, &uri, &token).await.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Reorder
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_reorder_assigns_positions() {
    let app = create_test_app();
    let token = register_user(&app, "alice").await;
    let a = create_task(&app, &token, json!({"text": "A"})).await["id"].as_i64().unwrap();
    let b = create_task(&app, &token, json!({"text": "B"})).await["id"].as_i64().unwrap();
    let c = create_task(&app, &token, json!({"text": "C"})).await["id"].as_i64().unwrap();

    let response = post(&app, "/tasks/reorder", &token, json!({"task_ids": [c, a, b]})).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"status": "ok"}));

    let list = get(&app, "/tasks", &token).await;
    assert_eq!(ids(&list.body), vec![c, a, b]);

    let again = post(&app, "/tasks/reorder", &token, json!({"task_ids": [c, a, b]})).await;
    assert_eq!(again.status, StatusCode::OK);
    assert_eq!(ids(&get(&app, "/tasks", &token).await.body), vec![c, a, b]);
    let orders: Vec<i64> = list
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|task| task["order"].as_i64().unwrap())
        .collect();
    assert_eq!(orders, vec![0, 1, 2]);
}

#[rstest]
#[tokio::test]
async fn test_reorder_accepts_numeric_strings_and_empty_list() {
    let app = create_test_app();
    let token = register_user(&app, "alice").await;
    let a = create_task(&app, &token, json!({"text": "A"})).await["id"].as_i64().unwrap();
    let b = create_task(&app, &token, json!({"text": "B"})).await["id"].as_i64().unwrap();

    let response = post(
        &app,
        "/tasks/reorder/",
        &token,
        json!({"task_ids": [b.to_string(), a]}),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(ids(&get(&app, "/tasks", &token).await.body), vec![b, a]);

    let empty = post(&app, "/tasks/reorder", &token, json!({"task_ids": []})).await;
    assert_eq!(empty.status, StatusCode::OK);
    assert_eq!(ids(&get(&app, "/tasks", &token).await.body), vec![b, a]);
}

#[rstest]
#[tokio::test]
async fn test_reorder_with_foreign_id_changes_nothing() {
    let app = create_test_app();
    let alice = register_user(&app, "alice").await;
    let bob = register_user(&app, "bob").await;
    let a = create_task(&app, &alice, json!({"text": "A"})).await["id"].as_i64().unwrap();
    let b = create_task(&app, &alice, json!({"text": "B"})).await["id"].as_i64().unwrap();
    let foreign = create_task_for(&app, &bob, "Bob's").await;

    let response = post(
        &app,
        "/tasks/reorder",
        &alice,
        json!({"task_ids": [b, foreign, a]}),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body,
        json!({"error": "Some task IDs are invalid or do not belong to you"})
    );

    assert_eq!(ids(&get(&app, "/tasks", &alice).await.body), vec![a, b]);
}

async fn create_task_for(app: &axum::Router, token: &str, text: &str) -> i64 {
    create_task(app, token, json!({"text": text})).await["id"]
        .as_i64()
        .unwrap()
}

#[rstest]
#[tokio::test]
async fn test_reorder_accepts_integral_floats() {
    let app = create_test_app();
    let token = register_user(&app, "alice").await;
    let a = create_task_for(&app, &token, "A").await;
    let b = create_task_for(&app, &token, "B").await;

    #[allow(clippy::cast_precision_loss)]
    let body = json!({"task_ids": [b as f64, a]});
    let response = post(&app, "/tasks/reorder", &token, body).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(ids(&get(&app, "/tasks", &token).await.body), vec![b, a]);
}

#[rstest]
#[case(json!({"task_ids": ["abc"]}), "task_ids[0]")]
#[case(json!({"task_ids": [1, 1.5]}), "task_ids[1]")]
#[case(json!({}), "task_ids")]
#[tokio::test]
async fn test_reorder_rejects_malformed_ids(
    #[case] body: serde_json::Value,
    #[case] field: &str,
) {
    let app = create_test_app();
    let token = register_user(&app, "alice").await;

    let response = post(&app, "/tasks/reorder", &token, body).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&response.body), vec![field.to_string()]);
}

#[rstest]
#[tokio::test]
async fn test_reorder_rejects_duplicates() {
    let app = create_test_app();
    let token = register_user(&app, "alice").await;
    let a = create_task_for(&app, &token, "A").await;

    let response = post(&app, "/tasks/reorder", &token, json!({"task_ids": [a, a]})).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&response.body), vec!["task_ids".to_string()]);
}

// =============================================================================
// Ownership and Authentication
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_other_users_tasks_are_invisible() {
    let app = create_test_app();
    let alice = register_user(&app, "alice").await;
    let bob = register_user(&app, "bob").await;
    let task = create_task_for(&app, &alice, "Private #secret").await;
    let uri = format!("/tasks/{task}");

    assert!(ids(&get(&app, "/tasks", &bob).await.body).is_empty());
    assert_eq!(get(&app, &uri, &bob).await.status, StatusCode::NOT_FOUND);
    assert_eq!(
        patch(&app, &uri, &bob, json!({"done": true})).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(delete(&app, &uri, &bob).await.status, StatusCode::NOT_FOUND);

    let untouched = get(&app, &uri, &alice).await;
    assert_eq!(untouched.body["done"], false);
}

#[rstest]
#[tokio::test]
async fn test_orders_are_per_owner() {
    let app = create_test_app();
    let alice = register_user(&app, "alice").await;
    let bob = register_user(&app, "bob").await;

    create_task_for(&app, &alice, "A1").await;
    create_task_for(&app, &alice, "A2").await;
    let bob_task = create_task(&app, &bob, json!({"text": "B1"})).await;

    assert_eq!(bob_task["order"], 0);
}

#[rstest]
#[tokio::test]
async fn test_non_integer_path_id_is_bad_request() {
    let app = create_test_app();
    let token = register_user(&app, "alice").await;

    let response = get(&app, "/tasks/not-a-number", &token).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "BAD_REQUEST");

    let missing = get(&app, "/tasks/999999", &token).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[rstest]
#[case(Method::GET, "/tasks")]
#[case(Method::POST, "/tasks/reorder")]
#[case(Method::GET, "/tasks/1")]
#[case(Method::DELETE, "/tasks/1")]
#[tokio::test]
async fn test_task_routes_require_token(#[case] method: Method, #[case] uri: &str) {
    let app = create_test_app();

    let response = send(&app, method, uri, None, Some(json!({"task_ids": []}))).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response
            .headers
            .get(header::WWW_AUTHENTICATE)
            .and_then(|value| value.to_str().ok()),
        Some("Bearer")
    );
}

#[rstest]
#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let app = create_test_app();

    let response = get(&app, "/tasks", "not.a-token").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
