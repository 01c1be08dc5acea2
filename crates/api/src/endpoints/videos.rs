//! Video endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use clipstream_common::AppResult;
use clipstream_core::{CreateVideoInput, VideoWithOwner};
use clipstream_db::entities::video::Model as VideoModel;
use serde::Deserialize;

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Watch query parameters.
#[derive(Debug, Deserialize)]
pub struct WatchQuery {
    /// Navigation hint; `notificationVideo` marks the viewer's
    /// notifications for this video as read.
    pub signal: Option<String>,
}

/// Publish video metadata.
async fn publish_video(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateVideoInput>,
) -> AppResult<ApiResponse<VideoModel>> {
    let video = state.video_service.create(&user, input).await?;
    Ok(ApiResponse::ok(video))
}

/// Watch a video: record the view and return it with its owner.
async fn get_video(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(query): Query<WatchQuery>,
) -> AppResult<ApiResponse<VideoWithOwner>> {
    let from_notification = query.signal.as_deref() == Some("notificationVideo");

    state
        .video_service
        .record_view(&video_id, user.as_ref(), from_notification)
        .await?;

    let video = state.video_service.get_with_owner(&video_id).await?;
    Ok(ApiResponse::ok(video))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/videos", post(publish_video))
        .route("/videos/{video_id}", get(get_video))
}
