//! Comment service.
//!
//! Create, update, and delete threaded comments. Delete is the core state
//! machine: the branch between hard delete (with full descendant cascade)
//! and soft delete (tombstone, subtree preserved) depends on who is acting,
//! and the whole mutation runs in one transaction so reaction cleanup and
//! comment removal cannot be observed half-done.

use crate::services::event_publisher::{EventPublisherService, rooms};
use crate::services::user::AuthorProjection;
use clipstream_common::{AppError, AppResult, IdGenerator};
use clipstream_db::{
    entities::{comment, user},
    repositories::{CommentRepository, ReactionRepository, UserRepository, VideoRepository},
};
use sea_orm::{DatabaseConnection, DatabaseTransaction, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    db: Arc<DatabaseConnection>,
    comment_repo: CommentRepository,
    video_repo: VideoRepository,
    reaction_repo: ReactionRepository,
    user_repo: UserRepository,
    event_publisher: Option<EventPublisherService>,
    id_gen: IdGenerator,
}

/// Input for creating a new comment.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInput {
    #[validate(length(min = 1, max = 3000))]
    pub content: String,

    /// Parent comment ID; absent for a top-level comment.
    pub parent_id: Option<String>,
}

/// Input for updating a comment.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentInput {
    #[validate(length(min = 1, max = 3000))]
    pub content: String,

    /// Owning video ID, used to address the video's room.
    pub video_id: String,
}

/// A comment joined with its author projection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedComment {
    pub id: String,
    pub video_id: String,
    pub content: String,
    pub parent_id: Option<String>,
    pub likes: i32,
    pub dislikes: i32,
    pub is_deleted: bool,
    pub created_at: String,
    pub owner: AuthorProjection,
}

impl PopulatedComment {
    fn new(comment: comment::Model, owner: AuthorProjection) -> Self {
        Self {
            id: comment.id,
            video_id: comment.video_id,
            content: comment.content,
            parent_id: comment.parent_id,
            likes: comment.likes,
            dislikes: comment.dislikes,
            is_deleted: comment.is_deleted,
            created_at: comment.created_at.to_rfc3339(),
            owner,
        }
    }
}

/// One page of a video's comments.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPage {
    pub comments: Vec<PopulatedComment>,
    pub total_comments: u64,
    pub total_pages: u64,
    pub current_page: u64,
}

/// How a delete resolved.
#[derive(Debug, Clone)]
pub enum DeleteOutcome {
    /// The comment (and, for video owners, its whole subtree) was removed.
    HardDeleted {
        comment_id: String,
        removed_comments: u64,
        removed_reactions: u64,
    },
    /// The comment was tombstoned in place to preserve its replies.
    SoftDeleted { comment: comment::Model },
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        comment_repo: CommentRepository,
        video_repo: VideoRepository,
        reaction_repo: ReactionRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            db,
            comment_repo,
            video_repo,
            reaction_repo,
            user_repo,
            event_publisher: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Create a new comment on a video.
    pub async fn create(
        &self,
        author: &user::Model,
        video_id: &str,
        input: CreateCommentInput,
    ) -> AppResult<PopulatedComment> {
        input.validate()?;

        if input.content.trim().is_empty() {
            return Err(AppError::Validation("Content field is required".to_string()));
        }

        // Video must exist before a comment can hang off it.
        self.video_repo.get_by_id(video_id).await?;

        // A reply must target an existing comment on the same video.
        if let Some(ref parent_id) = input.parent_id {
            let parent = self.comment_repo.get_by_id(parent_id).await?;
            if parent.video_id != video_id {
                return Err(AppError::Validation(
                    "Parent comment belongs to a different video".to_string(),
                ));
            }
        }

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            video_id: Set(video_id.to_string()),
            author_id: Set(author.id.clone()),
            content: Set(input.content),
            parent_id: Set(input.parent_id),
            likes: Set(0),
            dislikes: Set(0),
            is_deleted: Set(false),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.comment_repo.create(model).await?;
        let populated = PopulatedComment::new(created, AuthorProjection::from(author));

        self.publish(&rooms::video(video_id), "newComment", json!(&populated))
            .await;

        Ok(populated)
    }

    /// Replace a comment's content.
    ///
    /// Only the comment's author may edit it.
    pub async fn update(
        &self,
        actor_id: &str,
        comment_id: &str,
        input: UpdateCommentInput,
    ) -> AppResult<comment::Model> {
        input.validate()?;

        if input.content.trim().is_empty() {
            return Err(AppError::Validation("Content is required".to_string()));
        }

        let existing = self.comment_repo.get_by_id(comment_id).await?;
        if existing.author_id != actor_id {
            return Err(AppError::Forbidden(
                "You are not allowed to edit this comment".to_string(),
            ));
        }

        let updated = self
            .comment_repo
            .update_content(comment_id, &input.content)
            .await?;

        self.publish(
            &rooms::video(&input.video_id),
            "update-comment",
            json!({
                "content": updated.content,
                "commentId": updated.id,
            }),
        )
        .await;

        Ok(updated)
    }

    /// Delete a comment.
    ///
    /// Branch selection is a pure function of (video owner, has replies,
    /// comment owner):
    /// - the video owner hard-deletes the comment and every transitive
    ///   descendant, with all of their reactions;
    /// - the comment owner soft-deletes when replies exist, preserving the
    ///   subtree under a tombstone;
    /// - the comment owner hard-deletes a leaf comment;
    /// - anyone else gets `Forbidden` and no state change.
    ///
    /// Reaction cleanup and comment removal are atomic: the whole branch
    /// runs inside one transaction, and the room event fires only after the
    /// transaction commits.
    pub async fn delete(
        &self,
        actor_id: &str,
        video_id: &str,
        comment_id: &str,
    ) -> AppResult<DeleteOutcome> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::TransientStore(e.to_string()))?;

        let outcome = match self
            .delete_in_txn(&txn, actor_id, video_id, comment_id)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Err(abort) = txn.rollback().await {
                    tracing::warn!(error = %abort, "Failed to roll back comment delete transaction");
                }
                return Err(e);
            }
        };

        txn.commit()
            .await
            .map_err(|e| AppError::TransientStore(e.to_string()))?;

        match &outcome {
            DeleteOutcome::HardDeleted {
                comment_id,
                removed_comments,
                removed_reactions,
            } => {
                tracing::debug!(
                    comment_id = %comment_id,
                    removed_comments,
                    removed_reactions,
                    "Hard-deleted comment"
                );
                self.publish(
                    &rooms::video(video_id),
                    "hard-delete-comment",
                    json!({ "commentId": comment_id }),
                )
                .await;
            }
            DeleteOutcome::SoftDeleted { comment } => {
                tracing::debug!(comment_id = %comment.id, "Soft-deleted comment");
                self.publish(
                    &rooms::video(video_id),
                    "soft-delete-comment",
                    json!({
                        "commentId": comment.id,
                        "content": comment.content,
                        "isDeleted": comment.is_deleted,
                    }),
                )
                .await;
            }
        }

        Ok(outcome)
    }

    async fn delete_in_txn(
        &self,
        txn: &DatabaseTransaction,
        actor_id: &str,
        video_id: &str,
        comment_id: &str,
    ) -> AppResult<DeleteOutcome> {
        let target = self.comment_repo.get_by_id_in(txn, comment_id).await?;
        let video = self.video_repo.get_by_id_in(txn, video_id).await?;

        // Branch A: the video owner moderates the whole subtree away.
        if video.owner_id == actor_id {
            let subtree_ids = self
                .comment_repo
                .collect_subtree_ids_in(txn, comment_id)
                .await?;

            let removed_reactions = self
                .reaction_repo
                .delete_by_comment_ids_in(txn, &subtree_ids)
                .await?;
            let removed_comments = self
                .comment_repo
                .delete_by_ids_in(txn, &subtree_ids)
                .await?;

            return Ok(DeleteOutcome::HardDeleted {
                comment_id: comment_id.to_string(),
                removed_comments,
                removed_reactions,
            });
        }

        // Everyone else may only touch their own comment.
        if target.author_id != actor_id {
            return Err(AppError::Forbidden(
                "You are not allowed to delete this comment".to_string(),
            ));
        }

        let has_replies = self.comment_repo.count_children_in(txn, comment_id).await? > 0;
        let single = vec![comment_id.to_string()];

        // Branch B: replies exist, keep the subtree under a tombstone.
        if has_replies {
            let removed = self
                .reaction_repo
                .delete_by_comment_ids_in(txn, &single)
                .await?;
            let tombstoned = self.comment_repo.soft_delete_in(txn, comment_id).await?;

            tracing::trace!(removed_reactions = removed, "Cleared reactions before tombstone");
            return Ok(DeleteOutcome::SoftDeleted { comment: tombstoned });
        }

        // Branch C: a leaf comment goes away entirely.
        let removed_reactions = self
            .reaction_repo
            .delete_by_comment_ids_in(txn, &single)
            .await?;
        let removed_comments = self.comment_repo.delete_by_ids_in(txn, &single).await?;

        Ok(DeleteOutcome::HardDeleted {
            comment_id: comment_id.to_string(),
            removed_comments,
            removed_reactions,
        })
    }

    /// Get one page of a video's comments with author projections.
    pub async fn list(
        &self,
        video_id: &str,
        page: u64,
        per_page: u64,
    ) -> AppResult<CommentPage> {
        let comments = self
            .comment_repo
            .find_by_video(video_id, page, per_page)
            .await?;
        let total_comments = self.comment_repo.count_by_video(video_id).await?;
        let total_pages = total_comments.div_ceil(per_page.max(1));

        let author_ids: Vec<String> = comments.iter().map(|c| c.author_id.clone()).collect();
        let authors = self.user_repo.find_by_ids(&author_ids).await?;

        let comments = comments
            .into_iter()
            .map(|c| {
                let owner = authors
                    .iter()
                    .find(|u| u.id == c.author_id)
                    .map_or_else(
                        || AuthorProjection {
                            id: c.author_id.clone(),
                            username: String::new(),
                            full_name: None,
                            avatar: None,
                        },
                        AuthorProjection::from,
                    );
                PopulatedComment::new(c, owner)
            })
            .collect();

        Ok(CommentPage {
            comments,
            total_comments,
            total_pages,
            current_page: page,
        })
    }

    /// Publish after a committed mutation; failures are logged, never surfaced.
    async fn publish(&self, room: &str, event: &str, payload: serde_json::Value) {
        if let Some(ref event_publisher) = self.event_publisher {
            if let Err(e) = event_publisher.publish(room, event, payload).await {
                tracing::warn!(error = %e, room = %room, event = %event, "Failed to publish room event");
            }
        }
    }
}
