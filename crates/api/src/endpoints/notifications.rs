//! Notification endpoints.

use axum::{Json, Router, extract::State, routing::post};
use clipstream_common::AppResult;
use clipstream_core::FanOutInput;
use clipstream_db::entities::notification::{
    EntityKind, Model as NotificationModel, NotificationKind,
};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// List notifications request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsRequest {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub entity_type: EntityKind,
    /// Page number (1-based).
    #[serde(default = "default_page")]
    pub page: u64,
    /// Maximum results (default: 4, max: 100).
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_page() -> u64 {
    1
}

const fn default_limit() -> u64 {
    4
}

/// Notification response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    pub sender: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub entity_id: String,
    pub entity_type: String,
    pub title: Option<String>,
    pub message: Option<String>,
    pub thumbnail: Option<String>,
    pub sender_avatar: Option<String>,
    pub is_read: bool,
    pub created_at: String,
}

impl From<NotificationModel> for NotificationResponse {
    fn from(n: NotificationModel) -> Self {
        Self {
            id: n.id,
            sender: n.sender_id,
            kind: n.kind.as_str().to_string(),
            entity_id: n.entity_id,
            entity_type: n.entity_kind.as_str().to_string(),
            title: n.title,
            message: n.message,
            thumbnail: n.thumbnail,
            sender_avatar: n.sender_avatar,
            is_read: n.is_read,
            created_at: n.created_at.to_rfc3339(),
        }
    }
}

/// Notification list response with unread count.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub unread_count: u64,
}

/// Get notifications for the authenticated user.
async fn list_notifications(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListNotificationsRequest>,
) -> AppResult<ApiResponse<NotificationsListResponse>> {
    let limit = req.limit.clamp(1, 100);
    let (notifications, unread_count) = state
        .notification_service
        .list(&user.id, &req.kind, &req.entity_type, req.page.max(1), limit)
        .await?;

    Ok(ApiResponse::ok(NotificationsListResponse {
        notifications: notifications.into_iter().map(Into::into).collect(),
        unread_count,
    }))
}

/// Fan-out response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FanOutResponse {
    pub notified: usize,
}

/// Fan a notification out to every subscriber of the caller's channel.
async fn fan_out(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<FanOutInput>,
) -> AppResult<ApiResponse<FanOutResponse>> {
    let created = state.notification_service.fan_out(&user, input).await?;
    Ok(ApiResponse::ok(FanOutResponse {
        notified: created.len(),
    }))
}

/// Mark-entity-read request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkEntityReadRequest {
    pub entity_id: String,
    pub entity_type: EntityKind,
}

/// Mark-entity-read response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkEntityReadResponse {
    pub count: u64,
}

/// Mark the caller's unread notifications for an entity as read.
async fn mark_entity_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<MarkEntityReadRequest>,
) -> AppResult<ApiResponse<MarkEntityReadResponse>> {
    let count = state
        .notification_service
        .mark_entity_read(&user.id, &req.entity_id, &req.entity_type)
        .await?;
    Ok(ApiResponse::ok(MarkEntityReadResponse { count }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", post(list_notifications))
        .route("/notifications/fan-out", post(fan_out))
        .route("/notifications/mark-entity-read", post(mark_entity_read))
}
