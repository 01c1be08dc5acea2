//! Video service.

use crate::services::user::AuthorProjection;
use clipstream_common::{AppResult, IdGenerator};
use clipstream_db::{
    entities::notification::EntityKind,
    entities::video::{self, Category},
    entities::{user, view},
    repositories::{NotificationRepository, UserRepository, VideoRepository, ViewRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Video service for business logic.
#[derive(Clone)]
pub struct VideoService {
    video_repo: VideoRepository,
    user_repo: UserRepository,
    view_repo: ViewRepository,
    notification_repo: NotificationRepository,
    id_gen: IdGenerator,
}

/// Input for publishing video metadata.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideoInput {
    #[validate(length(min = 1, max = 256))]
    pub title: String,

    #[validate(length(min = 1))]
    pub description: String,

    #[validate(url)]
    pub video_url: String,

    #[validate(url)]
    pub thumbnail_url: String,

    pub duration_secs: i32,

    #[serde(default = "default_category")]
    pub category: Category,
}

const fn default_category() -> Category {
    Category::Video
}

/// A video joined with its owner projection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoWithOwner {
    #[serde(flatten)]
    pub video: video::Model,
    pub owner: AuthorProjection,
}

impl VideoService {
    /// Create a new video service.
    #[must_use]
    pub const fn new(
        video_repo: VideoRepository,
        user_repo: UserRepository,
        view_repo: ViewRepository,
        notification_repo: NotificationRepository,
    ) -> Self {
        Self {
            video_repo,
            user_repo,
            view_repo,
            notification_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Publish video metadata. Upload and transcoding happen elsewhere;
    /// this persists the catalog record.
    pub async fn create(
        &self,
        owner: &user::Model,
        input: CreateVideoInput,
    ) -> AppResult<video::Model> {
        input.validate()?;

        let model = video::ActiveModel {
            id: Set(self.id_gen.generate()),
            owner_id: Set(owner.id.clone()),
            title: Set(input.title),
            description: Set(input.description),
            video_url: Set(input.video_url),
            thumbnail_url: Set(input.thumbnail_url),
            duration_secs: Set(input.duration_secs),
            views: Set(0),
            likes: Set(0),
            dislikes: Set(0),
            is_published: Set(true),
            category: Set(input.category),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        self.video_repo.create(model).await
    }

    /// Get a video with its owner projection.
    pub async fn get_with_owner(&self, video_id: &str) -> AppResult<VideoWithOwner> {
        let video = self.video_repo.get_by_id(video_id).await?;
        let owner = self.user_repo.get_by_id(&video.owner_id).await?;

        Ok(VideoWithOwner {
            video,
            owner: AuthorProjection::from(&owner),
        })
    }

    /// Record a view of a video.
    ///
    /// An authenticated viewer bumps the counter once ever (tracked by a
    /// view marker); anonymous views always bump it. When the viewer
    /// arrived from a notification, their unread notifications for this
    /// video flip to read.
    pub async fn record_view(
        &self,
        video_id: &str,
        viewer: Option<&user::Model>,
        from_notification: bool,
    ) -> AppResult<()> {
        let should_increment = match viewer {
            Some(viewer) => {
                let existing = self
                    .view_repo
                    .find_by_video_and_viewer(video_id, &viewer.id)
                    .await?;

                if existing.is_none() {
                    let marker = view::ActiveModel {
                        id: Set(self.id_gen.generate()),
                        video_id: Set(video_id.to_string()),
                        viewer_id: Set(viewer.id.clone()),
                        created_at: Set(chrono::Utc::now().into()),
                    };
                    self.view_repo.create(marker).await?;
                    true
                } else {
                    false
                }
            }
            None => true,
        };

        if should_increment {
            self.video_repo.increment_views(video_id).await?;
        }

        if from_notification {
            if let Some(viewer) = viewer {
                let flipped = self
                    .notification_repo
                    .mark_entity_read(&viewer.id, video_id, &EntityKind::Video)
                    .await?;
                tracing::trace!(flipped, viewer_id = %viewer.id, "Marked video notifications read");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: "creator".to_string(),
            username_lower: "creator".to_string(),
            full_name: None,
            avatar_url: None,
            token: None,
            subscribers_count: 0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_video(id: &str, owner_id: &str) -> video::Model {
        video::Model {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            title: "Test video".to_string(),
            description: "A test video".to_string(),
            video_url: "https://cdn.example.com/v.mp4".to_string(),
            thumbnail_url: "https://cdn.example.com/t.jpg".to_string(),
            duration_secs: 60,
            views: 0,
            likes: 0,
            dislikes: 0,
            is_published: true,
            category: Category::Video,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn exec_ok() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }
    }

    fn service(db: Arc<sea_orm::DatabaseConnection>) -> VideoService {
        VideoService::new(
            VideoRepository::new(Arc::clone(&db)),
            UserRepository::new(Arc::clone(&db)),
            ViewRepository::new(Arc::clone(&db)),
            NotificationRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_get_with_owner() {
        let video = create_test_video("video1", "user1");
        let owner = create_test_user("user1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[video]])
                .append_query_results([[owner]])
                .into_connection(),
        );

        let result = service(db).get_with_owner("video1").await.unwrap();

        assert_eq!(result.video.id, "video1");
        assert_eq!(result.owner.id, "user1");
    }

    #[tokio::test]
    async fn test_record_view_first_time_increments() {
        let viewer = create_test_user("user1");
        let marker = view::Model {
            id: "w1".to_string(),
            video_id: "video1".to_string(),
            viewer_id: "user1".to_string(),
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // no existing marker
                .append_query_results([Vec::<view::Model>::new()])
                // marker insert returning
                .append_query_results([[marker]])
                // insert + views update
                .append_exec_results([exec_ok(), exec_ok()])
                .into_connection(),
        );

        service(db)
            .record_view("video1", Some(&viewer), false)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_record_view_repeat_does_not_increment() {
        let viewer = create_test_user("user1");
        let existing = view::Model {
            id: "w1".to_string(),
            video_id: "video1".to_string(),
            viewer_id: "user1".to_string(),
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );

        // No exec results appended: an increment would error the mock.
        service(db)
            .record_view("video1", Some(&viewer), false)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_record_view_from_notification_marks_read() {
        let viewer = create_test_user("user1");
        let existing = view::Model {
            id: "w1".to_string(),
            video_id: "video1".to_string(),
            viewer_id: "user1".to_string(),
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                // mark_entity_read update
                .append_exec_results([exec_ok()])
                .into_connection(),
        );

        service(db)
            .record_view("video1", Some(&viewer), true)
            .await
            .unwrap();
    }
}
