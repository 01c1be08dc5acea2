//! Reaction repository.

use std::sync::Arc;

use crate::entities::{Reaction, reaction, reaction::ReactionKind};
use clipstream_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QuerySelect, Set,
};

/// Reaction repository for database operations.
#[derive(Clone)]
pub struct ReactionRepository {
    db: Arc<DatabaseConnection>,
}

impl ReactionRepository {
    /// Create a new reaction repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a reaction by user and video.
    pub async fn find_by_user_and_video(
        &self,
        user_id: &str,
        video_id: &str,
    ) -> AppResult<Option<reaction::Model>> {
        self.find_by_user_and_video_in(self.db.as_ref(), user_id, video_id)
            .await
    }

    /// Find a reaction by user and video on the given connection.
    pub async fn find_by_user_and_video_in(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        video_id: &str,
    ) -> AppResult<Option<reaction::Model>> {
        Reaction::find()
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::VideoId.eq(video_id))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a reaction by user and comment.
    pub async fn find_by_user_and_comment(
        &self,
        user_id: &str,
        comment_id: &str,
    ) -> AppResult<Option<reaction::Model>> {
        self.find_by_user_and_comment_in(self.db.as_ref(), user_id, comment_id)
            .await
    }

    /// Find a reaction by user and comment on the given connection.
    pub async fn find_by_user_and_comment_in(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        comment_id: &str,
    ) -> AppResult<Option<reaction::Model>> {
        Reaction::find()
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::CommentId.eq(comment_id))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new reaction on the given connection.
    pub async fn create_in(
        &self,
        conn: &impl ConnectionTrait,
        model: reaction::ActiveModel,
    ) -> AppResult<reaction::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Switch an existing reaction's kind in place on the given connection.
    pub async fn update_kind_in(
        &self,
        conn: &impl ConnectionTrait,
        existing: reaction::Model,
        kind: ReactionKind,
    ) -> AppResult<reaction::Model> {
        let mut model: reaction::ActiveModel = existing.into();
        model.kind = Set(kind);
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a reaction by ID on the given connection.
    pub async fn delete_in(&self, conn: &impl ConnectionTrait, id: &str) -> AppResult<()> {
        Reaction::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete every reaction referencing any of the given comment IDs,
    /// on the given connection. Returns rows removed.
    pub async fn delete_by_comment_ids_in(
        &self,
        conn: &impl ConnectionTrait,
        comment_ids: &[String],
    ) -> AppResult<u64> {
        if comment_ids.is_empty() {
            return Ok(0);
        }

        let result = Reaction::delete_many()
            .filter(reaction::Column::CommentId.is_in(comment_ids.to_vec()))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Get a user's reactions across a set of comments.
    pub async fn find_by_user_and_comment_ids(
        &self,
        user_id: &str,
        comment_ids: &[String],
    ) -> AppResult<Vec<reaction::Model>> {
        if comment_ids.is_empty() {
            return Ok(vec![]);
        }

        Reaction::find()
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::CommentId.is_in(comment_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the video IDs a user has like-reacted to.
    pub async fn find_liked_video_ids(&self, user_id: &str) -> AppResult<Vec<String>> {
        Reaction::find()
            .select_only()
            .column(reaction::Column::VideoId)
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::VideoId.is_not_null())
            .filter(reaction::Column::Kind.eq(ReactionKind::Like))
            .into_tuple::<Option<String>>()
            .all(self.db.as_ref())
            .await
            .map(|ids| ids.into_iter().flatten().collect())
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count reactions of a kind on a video.
    pub async fn count_by_video_and_kind(
        &self,
        video_id: &str,
        kind: ReactionKind,
    ) -> AppResult<u64> {
        Reaction::find()
            .filter(reaction::Column::VideoId.eq(video_id))
            .filter(reaction::Column::Kind.eq(kind))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
