//! Comment endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, patch},
};
use clipstream_common::AppResult;
use clipstream_core::{
    CommentPage, CreateCommentInput, DeleteOutcome, PopulatedComment, UpdateCommentInput,
};
use clipstream_db::entities::comment::Model as CommentModel;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Comment listing query.
#[derive(Debug, Deserialize)]
pub struct ListCommentsQuery {
    /// Page number (1-based).
    #[serde(default = "default_page")]
    pub page: u64,
    /// Page size (max 100).
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_page() -> u64 {
    1
}

const fn default_limit() -> u64 {
    100
}

/// Get one page of a video's comments.
async fn list_comments(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(query): Query<ListCommentsQuery>,
) -> AppResult<ApiResponse<CommentPage>> {
    let limit = query.limit.clamp(1, 100);
    let page = state
        .comment_service
        .list(&video_id, query.page.max(1), limit)
        .await?;
    Ok(ApiResponse::ok(page))
}

/// Add a comment (or a reply) to a video.
async fn add_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Json(input): Json<CreateCommentInput>,
) -> AppResult<ApiResponse<PopulatedComment>> {
    let comment = state.comment_service.create(&user, &video_id, input).await?;
    Ok(ApiResponse::ok(comment))
}

/// Edit a comment's content.
async fn update_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    Json(input): Json<UpdateCommentInput>,
) -> AppResult<ApiResponse<CommentModel>> {
    let comment = state
        .comment_service
        .update(&user.id, &comment_id, input)
        .await?;
    Ok(ApiResponse::ok(comment))
}

/// Delete response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCommentResponse {
    pub comment_id: String,
    pub soft_deleted: bool,
    pub removed_comments: u64,
    pub removed_reactions: u64,
}

/// Delete a comment.
async fn delete_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((video_id, comment_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<DeleteCommentResponse>> {
    let outcome = state
        .comment_service
        .delete(&user.id, &video_id, &comment_id)
        .await?;

    let response = match outcome {
        DeleteOutcome::HardDeleted {
            comment_id,
            removed_comments,
            removed_reactions,
        } => DeleteCommentResponse {
            comment_id,
            soft_deleted: false,
            removed_comments,
            removed_reactions,
        },
        DeleteOutcome::SoftDeleted { comment } => DeleteCommentResponse {
            comment_id: comment.id,
            soft_deleted: true,
            removed_comments: 0,
            removed_reactions: 0,
        },
    };

    Ok(ApiResponse::ok(response))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/videos/{video_id}/comments",
            get(list_comments).post(add_comment),
        )
        .route("/comments/{comment_id}", patch(update_comment))
        .route(
            "/videos/{video_id}/comments/{comment_id}",
            delete(delete_comment),
        )
}
