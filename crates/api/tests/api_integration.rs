//! API integration tests.
//!
//! These tests verify the router, auth middleware, and handlers work
//! together over a mock database.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    middleware,
    routing::get,
};
use chrono::Utc;
use clipstream_api::{
    ChannelRegistry, middleware::AppState, router as api_router, streaming_handler,
};
use clipstream_core::{
    CommentService, EventPublisherService, NotificationService, ReactionService,
    SubscriptionService, UserService, VideoService,
};
use clipstream_db::entities::user;
use clipstream_db::repositories::{
    CommentRepository, NotificationRepository, ReactionRepository, SubscriptionRepository,
    UserRepository, VideoRepository, ViewRepository,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use std::sync::Arc;
use tower::ServiceExt;

fn create_test_user(id: &str, token: &str) -> user::Model {
    user::Model {
        id: id.to_string(),
        username: "alice".to_string(),
        username_lower: "alice".to_string(),
        full_name: Some("Alice".to_string()),
        avatar_url: None,
        token: Some(token.to_string()),
        subscribers_count: 0,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

/// Create a mock database connection seeded with the given query results.
fn create_mock_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection()
}

/// Build app state over an arbitrary mock connection.
fn create_state(db: Arc<DatabaseConnection>) -> AppState {
    let user_repo = UserRepository::new(Arc::clone(&db));
    let video_repo = VideoRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let reaction_repo = ReactionRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));
    let subscription_repo = SubscriptionRepository::new(Arc::clone(&db));
    let view_repo = ViewRepository::new(Arc::clone(&db));

    let registry = Arc::new(ChannelRegistry::new(16));
    let event_publisher: EventPublisherService = registry.clone();

    let user_service = UserService::new(user_repo.clone());
    let video_service = VideoService::new(
        video_repo.clone(),
        user_repo.clone(),
        view_repo,
        notification_repo.clone(),
    );

    let mut comment_service = CommentService::new(
        Arc::clone(&db),
        comment_repo.clone(),
        video_repo.clone(),
        reaction_repo.clone(),
        user_repo.clone(),
    );
    comment_service.set_event_publisher(event_publisher.clone());

    let reaction_service =
        ReactionService::new(Arc::clone(&db), reaction_repo, video_repo, comment_repo);

    let mut notification_service =
        NotificationService::new(notification_repo, subscription_repo.clone());
    notification_service.set_event_publisher(event_publisher.clone());

    let mut subscription_service = SubscriptionService::new(subscription_repo, user_repo);
    subscription_service.set_event_publisher(event_publisher);

    AppState {
        user_service,
        video_service,
        comment_service,
        reaction_service,
        notification_service,
        subscription_service,
        registry,
    }
}

/// Build the app the way the server binary does.
fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/streaming", get(streaming_handler))
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            clipstream_api::middleware::auth_middleware,
        ))
        .with_state(state)
}

#[tokio::test]
async fn test_add_comment_requires_auth() {
    let state = create_state(Arc::new(create_mock_db()));
    let app = create_app(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/videos/v1/comments")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"content":"First!"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_notifications_requires_auth() {
    let state = create_state(Arc::new(create_mock_db()));
    let app = create_app(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/notifications")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"type":"UPLOAD","entityType":"VIDEO"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_comments_is_public() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // comments for video
        .append_query_results([Vec::<clipstream_db::entities::comment::Model>::new()])
        // count
        .append_query_results([vec![maplit::btreemap! {
            "num_items" => sea_orm::Value::BigInt(Some(0)),
        }]])
        .into_connection();

    let state = create_state(Arc::new(db));
    let app = create_app(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/videos/v1/comments")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["data"]["totalComments"], 0);
    assert_eq!(json["data"]["comments"], serde_json::json!([]));
}

#[tokio::test]
async fn test_video_reaction_status_with_bearer_token() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // auth middleware: token lookup
        .append_query_results([[create_test_user("user1", "secret-token")]])
        // reaction lookup: none
        .append_query_results([Vec::<clipstream_db::entities::reaction::Model>::new()])
        .into_connection();

    let state = create_state(Arc::new(db));
    let app = create_app(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/videos/v1/reactions/status")
                .header(header::AUTHORIZATION, "Bearer secret-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["data"]["reaction"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_streaming_handshake_rejected_without_token() {
    let state = create_state(Arc::new(create_mock_db()));
    let app = create_app(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/streaming")
                .header(header::CONNECTION, "upgrade")
                .header(header::UPGRADE, "websocket")
                .header(header::SEC_WEBSOCKET_VERSION, "13")
                .header(header::SEC_WEBSOCKET_KEY, "dGhlIHNhbXBsZSBub25jZQ==")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_streaming_handshake_rejected_with_bad_token() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // handshake token lookup misses
        .append_query_results([Vec::<user::Model>::new()])
        .into_connection();

    let state = create_state(Arc::new(db));
    let app = create_app(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/streaming?i=bogus")
                .header(header::CONNECTION, "upgrade")
                .header(header::UPGRADE, "websocket")
                .header(header::SEC_WEBSOCKET_VERSION, "13")
                .header(header::SEC_WEBSOCKET_KEY, "dGhlIHNhbXBsZSBub25jZQ==")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let state = create_state(Arc::new(create_mock_db()));
    let app = create_app(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
