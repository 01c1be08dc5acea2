//! View marker repository.

use std::sync::Arc;

use crate::entities::{View, view};
use clipstream_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// View marker repository for database operations.
#[derive(Clone)]
pub struct ViewRepository {
    db: Arc<DatabaseConnection>,
}

impl ViewRepository {
    /// Create a new view repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a view marker by video and viewer.
    pub async fn find_by_video_and_viewer(
        &self,
        video_id: &str,
        viewer_id: &str,
    ) -> AppResult<Option<view::Model>> {
        View::find()
            .filter(view::Column::VideoId.eq(video_id))
            .filter(view::Column::ViewerId.eq(viewer_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new view marker.
    pub async fn create(&self, model: view::ActiveModel) -> AppResult<view::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_find_by_video_and_viewer_none() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<view::Model>::new()])
                .into_connection(),
        );

        let repo = ViewRepository::new(db);
        let result = repo
            .find_by_video_and_viewer("video1", "user1")
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_find_by_video_and_viewer_found() {
        let marker = view::Model {
            id: "w1".to_string(),
            video_id: "video1".to_string(),
            viewer_id: "user1".to_string(),
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[marker]])
                .into_connection(),
        );

        let repo = ViewRepository::new(db);
        let result = repo
            .find_by_video_and_viewer("video1", "user1")
            .await
            .unwrap();

        assert!(result.is_some());
    }
}
