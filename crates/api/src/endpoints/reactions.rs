//! Reaction endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use clipstream_common::AppResult;
use clipstream_db::entities::reaction::ReactionKind;
use clipstream_db::entities::video::Model as VideoModel;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Toggle request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleReactionRequest {
    /// Requested kind; repeating the current kind removes the reaction.
    pub user_reaction: ReactionKind,
}

/// Toggle response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleReactionResponse {
    /// `created`, `switched`, or `removed`.
    pub result: String,
}

/// Reaction status response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionStatusResponse {
    /// The caller's current kind, or null.
    pub reaction: Option<ReactionKind>,
}

/// Toggle the caller's reaction on a video.
async fn toggle_video_reaction(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Json(req): Json<ToggleReactionRequest>,
) -> AppResult<ApiResponse<ToggleReactionResponse>> {
    let outcome = state
        .reaction_service
        .toggle_video_reaction(&user.id, &video_id, req.user_reaction)
        .await?;
    Ok(ApiResponse::ok(ToggleReactionResponse {
        result: outcome.as_str().to_string(),
    }))
}

/// Get the caller's reaction on a video.
async fn video_reaction_status(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> AppResult<ApiResponse<ReactionStatusResponse>> {
    let reaction = state
        .reaction_service
        .video_reaction_status(&user.id, &video_id)
        .await?;
    Ok(ApiResponse::ok(ReactionStatusResponse { reaction }))
}

/// Toggle the caller's reaction on a comment.
async fn toggle_comment_reaction(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    Json(req): Json<ToggleReactionRequest>,
) -> AppResult<ApiResponse<ToggleReactionResponse>> {
    let outcome = state
        .reaction_service
        .toggle_comment_reaction(&user.id, &comment_id, req.user_reaction)
        .await?;
    Ok(ApiResponse::ok(ToggleReactionResponse {
        result: outcome.as_str().to_string(),
    }))
}

/// Get the caller's reaction on a comment.
async fn comment_reaction_status(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
) -> AppResult<ApiResponse<ReactionStatusResponse>> {
    let reaction = state
        .reaction_service
        .comment_reaction_status(&user.id, &comment_id)
        .await?;
    Ok(ApiResponse::ok(ReactionStatusResponse { reaction }))
}

/// Bulk status response: comment ID to the caller's kind.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentReactionsResponse {
    pub reactions: HashMap<String, ReactionKind>,
}

/// Get the caller's reaction on every comment under a video.
async fn comment_reactions_for_video(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> AppResult<ApiResponse<CommentReactionsResponse>> {
    let reactions = state
        .reaction_service
        .comment_reactions_for_video(&user.id, &video_id)
        .await?;
    Ok(ApiResponse::ok(CommentReactionsResponse { reactions }))
}

/// Get the videos the caller has liked.
async fn liked_videos(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<VideoModel>>> {
    let videos = state.reaction_service.liked_videos(&user.id).await?;
    Ok(ApiResponse::ok(videos))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/videos/liked", get(liked_videos))
        .route("/videos/{video_id}/reactions", post(toggle_video_reaction))
        .route(
            "/videos/{video_id}/reactions/status",
            get(video_reaction_status),
        )
        .route(
            "/videos/{video_id}/comment-reactions",
            get(comment_reactions_for_video),
        )
        .route(
            "/comments/{comment_id}/reactions",
            post(toggle_comment_reaction),
        )
        .route(
            "/comments/{comment_id}/reactions/status",
            get(comment_reaction_status),
        )
}
