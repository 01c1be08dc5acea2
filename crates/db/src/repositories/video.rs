//! Video repository.

use std::sync::Arc;

use crate::entities::{Video, video};
use clipstream_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    sea_query::Expr,
};

/// Video repository for database operations.
#[derive(Clone)]
pub struct VideoRepository {
    db: Arc<DatabaseConnection>,
}

impl VideoRepository {
    /// Create a new video repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a video by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<video::Model>> {
        self.find_by_id_in(self.db.as_ref(), id).await
    }

    /// Find a video by ID on the given connection.
    pub async fn find_by_id_in(
        &self,
        conn: &impl ConnectionTrait,
        id: &str,
    ) -> AppResult<Option<video::Model>> {
        Video::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a video by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<video::Model> {
        self.get_by_id_in(self.db.as_ref(), id).await
    }

    /// Find a video by ID on the given connection, returning an error if not found.
    pub async fn get_by_id_in(
        &self,
        conn: &impl ConnectionTrait,
        id: &str,
    ) -> AppResult<video::Model> {
        self.find_by_id_in(conn, id)
            .await?
            .ok_or_else(|| AppError::VideoNotFound(id.to_string()))
    }

    /// Find videos by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<video::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Video::find()
            .filter(video::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new video.
    pub async fn create(&self, model: video::ActiveModel) -> AppResult<video::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Increment view count atomically (single UPDATE query, no fetch).
    pub async fn increment_views(&self, video_id: &str) -> AppResult<()> {
        Video::update_many()
            .col_expr(video::Column::Views, Expr::col(video::Column::Views).add(1))
            .filter(video::Column::Id.eq(video_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Increment like count atomically on the given connection.
    pub async fn increment_likes_in(
        &self,
        conn: &impl ConnectionTrait,
        video_id: &str,
    ) -> AppResult<()> {
        Video::update_many()
            .col_expr(video::Column::Likes, Expr::col(video::Column::Likes).add(1))
            .filter(video::Column::Id.eq(video_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Decrement like count atomically on the given connection, floored at zero.
    pub async fn decrement_likes_in(
        &self,
        conn: &impl ConnectionTrait,
        video_id: &str,
    ) -> AppResult<()> {
        Video::update_many()
            .col_expr(video::Column::Likes, Expr::cust("GREATEST(likes - 1, 0)"))
            .filter(video::Column::Id.eq(video_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Increment dislike count atomically on the given connection.
    pub async fn increment_dislikes_in(
        &self,
        conn: &impl ConnectionTrait,
        video_id: &str,
    ) -> AppResult<()> {
        Video::update_many()
            .col_expr(
                video::Column::Dislikes,
                Expr::col(video::Column::Dislikes).add(1),
            )
            .filter(video::Column::Id.eq(video_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Decrement dislike count atomically on the given connection, floored at zero.
    pub async fn decrement_dislikes_in(
        &self,
        conn: &impl ConnectionTrait,
        video_id: &str,
    ) -> AppResult<()> {
        Video::update_many()
            .col_expr(
                video::Column::Dislikes,
                Expr::cust("GREATEST(dislikes - 1, 0)"),
            )
            .filter(video::Column::Id.eq(video_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
