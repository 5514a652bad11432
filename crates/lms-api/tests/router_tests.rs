//! Requests rejected before any query reaches the database.

use crate::common::{TestClient, TestStateBuilder, token_for};
use axum::http::StatusCode;
use lms_api::auth::Role;
use serde_json::json;
use uuid::Uuid;

fn client() -> (TestClient, lms_api::ApiState) {
    let state = TestStateBuilder::new().build_lazy();
    (TestClient::new(state.clone()), state)
}

#[tokio::test]
async fn test_health_check() {
    let (client, _) = client();

    let response = client.get("/health").await;
    response.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_uses_error_envelope() {
    let (client, _) = client();

    let response = client.get("/definitely/not/a/route").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.error(), "The requested resource was not found");
}

#[tokio::test]
async fn test_create_course_without_token() {
    let (client, _) = client();

    let response = client
        .post_json("/courses", json!({ "title": "Rust 101" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.error(), "Not authenticated");
}

#[tokio::test]
async fn test_invalid_token_rejected() {
    let (client, _) = client();

    let response = client
        .post_json_auth("/courses", "not-a-jwt", json!({ "title": "Rust 101" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.error(), "Invalid or expired token");
}

#[tokio::test]
async fn test_learner_cannot_author() {
    let (client, state) = client();
    let (_, token) = token_for(&state, Role::Learner);

    let response = client
        .post_json_auth("/courses", &token, json!({ "title": "Rust 101" }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let module_id = Uuid::new_v4();
    let response = client
        .put_json_auth(
            &format!("/modules/{module_id}/lessons/order"),
            &token,
            json!({ "ordered_ids": [Uuid::new_v4()] }),
        )
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_empty_title_rejected() {
    let (client, state) = client();
    let (_, token) = token_for(&state, Role::Instructor);

    let response = client
        .post_json_auth("/courses", &token, json!({ "title": "" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.error().starts_with("Invalid input: title"));
}

#[tokio::test]
async fn test_empty_reorder_rejected() {
    let (client, state) = client();
    let (_, token) = token_for(&state, Role::Instructor);

    let course_id = Uuid::new_v4();
    let response = client
        .put_json_auth(
            &format!("/courses/{course_id}/modules/order"),
            &token,
            json!({ "ordered_ids": [] }),
        )
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.error().contains("ordered_ids cannot be empty"));
}

#[tokio::test]
async fn test_malformed_json_uses_error_envelope() {
    let (client, state) = client();
    let (_, token) = token_for(&state, Role::Instructor);

    let response = client
        .post_json_auth("/courses", &token, json!({ "title": 42 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(!response.error().is_empty());
}

#[tokio::test]
async fn test_upload_url_placeholder() {
    let (client, state) = client();
    let (_, token) = token_for(&state, Role::Instructor);

    let response = client
        .post_json_auth(
            "/storage/upload-url",
            &token,
            json!({ "filename": "intro video.mp4", "content_type": "video/mp4" }),
        )
        .await;
    response.assert_status(StatusCode::OK);

    let data = response.data();
    assert!(data["url"].as_str().unwrap().starts_with("https://"));
    assert!(data["expires_in"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_cookie_token_accepted() {
    let (client, state) = client();
    let body = json!({ "filename": "notes.pdf", "content_type": "application/pdf" });

    let (_, learner) = token_for(&state, Role::Learner);
    let response = client
        .post_json_with_cookie("/storage/upload-url", &learner, body.clone())
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let (_, instructor) = token_for(&state, Role::Instructor);
    let response = client
        .post_json_with_cookie("/storage/upload-url", &instructor, body)
        .await;
    response.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_leaderboard_limit_validated() {
    let (client, _) = client();

    let response = client.get("/leaderboard?limit=0").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_path_uses_error_envelope() {
    let (client, state) = client();
    let (_, token) = token_for(&state, Role::Instructor);

    let response = client.get("/courses/not-a-uuid").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.headers["content-type"], "application/json");
    assert!(response.error().starts_with("Invalid URL"));

    let response = client
        .delete_auth("/series/not-a-uuid/courses/42", &token)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.error().starts_with("Invalid URL"));
}

#[tokio::test]
async fn test_malformed_query_uses_error_envelope() {
    let (client, _) = client();

    let response = client.get("/leaderboard?period=bogus").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.headers["content-type"], "application/json");
    assert!(response.error().contains("period"));

    let response = client.get("/courses?page=first").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.error().contains("page"));
}
