//! API integration tests.
//!
//! These drive the assembled router with `oneshot` against a mock database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use chrono::Utc;
use inkwell_api::{AppState, app};
use inkwell_common::config::{AuthConfig, Config, DatabaseConfig, ServerConfig};
use inkwell_core::{LogMailer, NoOpDispatcher};
use inkwell_db::entities::{blog, like, user};
use maplit::btreemap;
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
use serde_json::{Value as Json, json};
use tower::ServiceExt;

/// Create a test configuration.
fn create_test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            url: "https://inkwell.example".to_string(),
        },
        database: DatabaseConfig {
            url: "postgres://localhost/test".to_string(),
            max_connections: 10,
            min_connections: 1,
        },
        auth: AuthConfig::default(),
        email: None,
    }
}

fn create_test_user(id: &str, is_private: bool) -> user::Model {
    user::Model {
        id: id.to_string(),
        username: id.to_string(),
        username_lower: id.to_lowercase(),
        email: format!("{id}@example.com"),
        phone: format!("+1555{id}"),
        name: id.to_string(),
        password_hash: String::new(),
        token: Some(format!("token-{id}")),
        is_active: true,
        is_private,
        activation_token: None,
        activation_expires_at: None,
        bio: None,
        avatar_url: None,
        avatar_handle: None,
        posts_count: 0,
        followers_count: 0,
        following_count: 0,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

/// Create the test router over a prepared mock database.
fn create_test_router(db: MockDatabase) -> Router {
    let state = AppState::new(
        Arc::new(db.into_connection()),
        Arc::new(NoOpDispatcher),
        Arc::new(LogMailer),
        &create_test_config(),
    );
    app(state)
}

fn empty_router() -> Router {
    create_test_router(MockDatabase::new(DatabaseBackend::Postgres))
}

fn post_json(uri: &str, token: Option<&str>, body: Json) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn read_json(response: axum::response::Response) -> Json {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_healthz() {
    let response = empty_router()
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let response = empty_router()
        .oneshot(post_json("/api/nonexistent", None, json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_missing_body_field_uses_error_envelope() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[create_test_user("alice", false)]]);

    let response = create_test_router(db)
        .oneshot(post_json(
            "/api/following/create",
            Some("token-alice"),
            json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["message"].as_str().unwrap().contains("userId"));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let request = Request::builder()
        .uri("/api/auth/signin")
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from("{\"login\": "))
        .unwrap();

    let response = empty_router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_follow_without_credentials_is_unauthorized() {
    let response = empty_router()
        .oneshot(post_json(
            "/api/following/create",
            None,
            json!({"userId": "bob"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_signup_with_invalid_email_fails_validation() {
    let response = empty_router()
        .oneshot(post_json(
            "/api/auth/signup",
            None,
            json!({
                "username": "alice",
                "email": "not-an-email",
                "phone": "+15550100",
                "name": "Alice",
                "password": "correct horse battery"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_self_follow_is_rejected() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[create_test_user("alice", false)]]);

    let response = create_test_router(db)
        .oneshot(post_json(
            "/api/following/create",
            Some("token-alice"),
            json!({"userId": "alice"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["code"], "SELF_FOLLOW");
}

#[tokio::test]
async fn test_following_status_not_following() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[create_test_user("alice", false)]])
        .append_query_results([Vec::<inkwell_db::entities::follow_edge::Model>::new()]);

    let response = create_test_router(db)
        .oneshot(post_json(
            "/api/following/status",
            Some("token-alice"),
            json!({"userId": "bob"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body, json!({"success": true, "status": "not_following"}));
}

#[tokio::test]
async fn test_unread_count() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[create_test_user("dave", true)]])
        .append_query_results([[btreemap! {
            "num_items" => Into::<Value>::into(2i64),
        }]]);

    let response = create_test_router(db)
        .oneshot(post_json(
            "/api/notifications/unread-count",
            Some("token-dave"),
            json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body, json!({"success": true, "count": 2}));
}

#[tokio::test]
async fn test_private_blogs_hidden_from_anonymous_viewer() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[create_test_user("dave", true)]]);

    let response = create_test_router(db)
        .oneshot(post_json("/api/blogs/list", None, json!({"userId": "dave"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = read_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_like_own_blog_counts_once() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[create_test_user("erin", false)]])
        .append_query_results([[blog::Model {
            id: "b1".to_string(),
            author_id: "erin".to_string(),
            title: "Hello".to_string(),
            content: "World".to_string(),
            cover_image_url: None,
            cover_image_handle: None,
            is_ai_generated: false,
            likes_count: 0,
            comments_count: 0,
            created_at: Utc::now().into(),
            updated_at: None,
        }]])
        .append_query_results([[create_test_user("erin", false)]])
        .append_query_results([Vec::<like::Model>::new()])
        .append_query_results([[like::Model {
            id: "l1".to_string(),
            user_id: "erin".to_string(),
            blog_id: Some("b1".to_string()),
            comment_id: None,
            created_at: Utc::now().into(),
        }]])
        .append_query_results([[btreemap! {
            "num_items" => Into::<Value>::into(1i64),
        }]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }]);

    let response = create_test_router(db)
        .oneshot(post_json(
            "/api/blogs/like",
            Some("token-erin"),
            json!({"blogId": "b1"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(
        body,
        json!({"success": true, "liked": true, "likesCount": 1})
    );
}

#[tokio::test]
async fn test_show_user_requires_identifier() {
    let response = empty_router()
        .oneshot(post_json("/api/users/show", None, json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_streaming_without_token_is_unauthorized() {
    let response = empty_router()
        .oneshot(
            Request::builder()
                .uri("/streaming")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_streaming_with_unknown_token_is_unauthorized() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<user::Model>::new()]);

    let response = create_test_router(db)
        .oneshot(
            Request::builder()
                .uri("/streaming?token=nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
