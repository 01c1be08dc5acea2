//! Comment repository.

use std::sync::Arc;

use crate::entities::{Comment, comment};
use clipstream_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, sea_query::Expr,
};

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<comment::Model>> {
        self.find_by_id_in(self.db.as_ref(), id).await
    }

    /// Find a comment by ID on the given connection.
    pub async fn find_by_id_in(
        &self,
        conn: &impl ConnectionTrait,
        id: &str,
    ) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a comment by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<comment::Model> {
        self.get_by_id_in(self.db.as_ref(), id).await
    }

    /// Find a comment by ID on the given connection, returning an error if not found.
    pub async fn get_by_id_in(
        &self,
        conn: &impl ConnectionTrait,
        id: &str,
    ) -> AppResult<comment::Model> {
        self.find_by_id_in(conn, id)
            .await?
            .ok_or_else(|| AppError::CommentNotFound(id.to_string()))
    }

    /// Create a new comment.
    pub async fn create(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Replace a comment's content in place.
    pub async fn update_content(&self, id: &str, content: &str) -> AppResult<comment::Model> {
        let existing = self.get_by_id(id).await?;
        let mut model: comment::ActiveModel = existing.into();
        model.content = Set(content.to_string());
        model.updated_at = Set(Some(chrono::Utc::now().into()));
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get direct replies of a comment on the given connection.
    pub async fn find_children_in(
        &self,
        conn: &impl ConnectionTrait,
        comment_id: &str,
    ) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(comment::Column::ParentId.eq(comment_id))
            .order_by_asc(comment::Column::Id)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count direct replies of a comment on the given connection.
    pub async fn count_children_in(
        &self,
        conn: &impl ConnectionTrait,
        comment_id: &str,
    ) -> AppResult<u64> {
        Comment::find()
            .filter(comment::Column::ParentId.eq(comment_id))
            .count(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Collect the IDs of a comment and all of its transitive descendants.
    ///
    /// Worklist traversal over the `parent_id` index; depth is unbounded.
    /// Must run on the deleting transaction so concurrent replies cannot
    /// slip between discovery and removal.
    pub async fn collect_subtree_ids_in(
        &self,
        conn: &impl ConnectionTrait,
        comment_id: &str,
    ) -> AppResult<Vec<String>> {
        let mut collected = vec![comment_id.to_string()];
        let mut frontier = vec![comment_id.to_string()];

        while !frontier.is_empty() {
            let children: Vec<String> = Comment::find()
                .select_only()
                .column(comment::Column::Id)
                .filter(comment::Column::ParentId.is_in(frontier.clone()))
                .into_tuple()
                .all(conn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            frontier = children;
            collected.extend(frontier.iter().cloned());
        }

        Ok(collected)
    }

    /// Delete comments by IDs on the given connection. Returns rows removed.
    pub async fn delete_by_ids_in(
        &self,
        conn: &impl ConnectionTrait,
        ids: &[String],
    ) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = Comment::delete_many()
            .filter(comment::Column::Id.is_in(ids.to_vec()))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Flag a comment as deleted and replace its content with the tombstone,
    /// on the given connection.
    pub async fn soft_delete_in(
        &self,
        conn: &impl ConnectionTrait,
        id: &str,
    ) -> AppResult<comment::Model> {
        let existing = self.get_by_id_in(conn, id).await?;
        let mut model: comment::ActiveModel = existing.into();
        model.is_deleted = Set(true);
        model.content = Set(comment::TOMBSTONE_CONTENT.to_string());
        model.updated_at = Set(Some(chrono::Utc::now().into()));
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get comments for a video (paginated, oldest first).
    pub async fn find_by_video(
        &self,
        video_id: &str,
        page: u64,
        per_page: u64,
    ) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(comment::Column::VideoId.eq(video_id))
            .order_by_asc(comment::Column::Id)
            .offset(page.saturating_sub(1) * per_page)
            .limit(per_page)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count comments on a video.
    pub async fn count_by_video(&self, video_id: &str) -> AppResult<u64> {
        Comment::find()
            .filter(comment::Column::VideoId.eq(video_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the IDs of every comment on a video.
    pub async fn find_ids_by_video(&self, video_id: &str) -> AppResult<Vec<String>> {
        Comment::find()
            .select_only()
            .column(comment::Column::Id)
            .filter(comment::Column::VideoId.eq(video_id))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Increment like count atomically on the given connection.
    pub async fn increment_likes_in(
        &self,
        conn: &impl ConnectionTrait,
        comment_id: &str,
    ) -> AppResult<()> {
        Comment::update_many()
            .col_expr(
                comment::Column::Likes,
                Expr::col(comment::Column::Likes).add(1),
            )
            .filter(comment::Column::Id.eq(comment_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Decrement like count atomically on the given connection, floored at zero.
    pub async fn decrement_likes_in(
        &self,
        conn: &impl ConnectionTrait,
        comment_id: &str,
    ) -> AppResult<()> {
        Comment::update_many()
            .col_expr(comment::Column::Likes, Expr::cust("GREATEST(likes - 1, 0)"))
            .filter(comment::Column::Id.eq(comment_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Increment dislike count atomically on the given connection.
    pub async fn increment_dislikes_in(
        &self,
        conn: &impl ConnectionTrait,
        comment_id: &str,
    ) -> AppResult<()> {
        Comment::update_many()
            .col_expr(
                comment::Column::Dislikes,
                Expr::col(comment::Column::Dislikes).add(1),
            )
            .filter(comment::Column::Id.eq(comment_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Decrement dislike count atomically on the given connection, floored at zero.
    pub async fn decrement_dislikes_in(
        &self,
        conn: &impl ConnectionTrait,
        comment_id: &str,
    ) -> AppResult<()> {
        Comment::update_many()
            .col_expr(
                comment::Column::Dislikes,
                Expr::cust("GREATEST(dislikes - 1, 0)"),
            )
            .filter(comment::Column::Id.eq(comment_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_comment(id: &str, video_id: &str, parent_id: Option<&str>) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            video_id: video_id.to_string(),
            author_id: "user1".to_string(),
            content: "A comment".to_string(),
            parent_id: parent_id.map(std::string::ToString::to_string),
            likes: 0,
            dislikes: 0,
            is_deleted: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<comment::Model>::new()])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let result = repo.get_by_id("nonexistent").await;

        assert!(result.is_err());
        match result {
            Err(AppError::CommentNotFound(id)) => assert_eq!(id, "nonexistent"),
            _ => panic!("Expected CommentNotFound error"),
        }
    }

    /// Row shape for ID-only projections against the mock database.
    fn id_row(id: &str) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        maplit::btreemap! {
            "id" => sea_orm::Value::from(id),
        }
    }

    #[tokio::test]
    async fn test_collect_subtree_ids_single_node() {
        // No children: one query returning an empty frontier ends the loop.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<std::collections::BTreeMap<&str, sea_orm::Value>>::new()])
                .into_connection(),
        );

        let repo = CommentRepository::new(Arc::clone(&db));
        let ids = repo.collect_subtree_ids_in(db.as_ref(), "c1").await.unwrap();

        assert_eq!(ids, vec!["c1".to_string()]);
    }

    #[tokio::test]
    async fn test_collect_subtree_ids_two_levels() {
        // c1 -> [c2, c3], c2/c3 -> [c4], c4 -> [].
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([
                    vec![id_row("c2"), id_row("c3")],
                    vec![id_row("c4")],
                    Vec::new(),
                ])
                .into_connection(),
        );

        let repo = CommentRepository::new(Arc::clone(&db));
        let ids = repo.collect_subtree_ids_in(db.as_ref(), "c1").await.unwrap();

        assert_eq!(ids, vec!["c1", "c2", "c3", "c4"]);
    }

    #[tokio::test]
    async fn test_delete_by_ids_empty_is_noop() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = CommentRepository::new(Arc::clone(&db));
        let removed = repo.delete_by_ids_in(db.as_ref(), &[]).await.unwrap();

        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn test_delete_by_ids_reports_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 3,
                }])
                .into_connection(),
        );

        let repo = CommentRepository::new(Arc::clone(&db));
        let removed = repo
            .delete_by_ids_in(
                db.as_ref(),
                &["c1".to_string(), "c2".to_string(), "c3".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(removed, 3);
    }

    #[tokio::test]
    async fn test_find_by_video() {
        let c1 = create_test_comment("c1", "video1", None);
        let c2 = create_test_comment("c2", "video1", Some("c1"));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[c1, c2]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let result = repo.find_by_video("video1", 1, 100).await.unwrap();

        assert_eq!(result.len(), 2);
    }
}
