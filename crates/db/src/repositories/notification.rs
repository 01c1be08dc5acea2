//! Notification repository.

use std::sync::Arc;

use crate::entities::{
    Notification,
    notification::{self, EntityKind, NotificationKind},
};
use clipstream_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Expr,
};

/// Notification repository for database operations.
#[derive(Clone)]
pub struct NotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepository {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new notification.
    pub async fn create(&self, model: notification::ActiveModel) -> AppResult<notification::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get notifications for a receiver filtered by kind and entity kind
    /// (paginated, newest first).
    pub async fn find_by_receiver(
        &self,
        receiver_id: &str,
        kind: &NotificationKind,
        entity_kind: &EntityKind,
        page: u64,
        limit: u64,
    ) -> AppResult<Vec<notification::Model>> {
        Notification::find()
            .filter(notification::Column::ReceiverId.eq(receiver_id))
            .filter(notification::Column::Kind.eq(kind.clone()))
            .filter(notification::Column::EntityKind.eq(entity_kind.clone()))
            .order_by_desc(notification::Column::CreatedAt)
            .offset(page.saturating_sub(1) * limit)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count unread notifications for a receiver, filtered like
    /// [`Self::find_by_receiver`].
    pub async fn count_unread(
        &self,
        receiver_id: &str,
        kind: &NotificationKind,
        entity_kind: &EntityKind,
    ) -> AppResult<u64> {
        Notification::find()
            .filter(notification::Column::ReceiverId.eq(receiver_id))
            .filter(notification::Column::Kind.eq(kind.clone()))
            .filter(notification::Column::EntityKind.eq(entity_kind.clone()))
            .filter(notification::Column::IsRead.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark every unread notification a receiver has for an entity as read.
    /// Returns the number of rows flipped.
    pub async fn mark_entity_read(
        &self,
        receiver_id: &str,
        entity_id: &str,
        entity_kind: &EntityKind,
    ) -> AppResult<u64> {
        let result = Notification::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::ReceiverId.eq(receiver_id))
            .filter(notification::Column::EntityId.eq(entity_id))
            .filter(notification::Column::EntityKind.eq(entity_kind.clone()))
            .filter(notification::Column::IsRead.eq(false))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Remove notifications created before the cutoff. Returns rows removed.
    ///
    /// Retention sweep only; request paths never delete notifications.
    pub async fn delete_expired(
        &self,
        cutoff: chrono::DateTime<chrono::Utc>,
    ) -> AppResult<u64> {
        let result = Notification::delete_many()
            .filter(notification::Column::CreatedAt.lt(cutoff))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_notification(id: &str, receiver_id: &str) -> notification::Model {
        notification::Model {
            id: id.to_string(),
            receiver_id: receiver_id.to_string(),
            sender_id: Some("sender1".to_string()),
            kind: NotificationKind::Upload,
            entity_id: "video1".to_string(),
            entity_kind: EntityKind::Video,
            title: Some("New video".to_string()),
            message: Some("sender1 uploaded a new video".to_string()),
            thumbnail: None,
            sender_avatar: None,
            is_read: false,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_receiver() {
        let n1 = create_test_notification("n1", "user1");
        let n2 = create_test_notification("n2", "user1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[n1, n2]])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let result = repo
            .find_by_receiver(
                "user1",
                &NotificationKind::Upload,
                &EntityKind::Video,
                1,
                10,
            )
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_mark_entity_read_reports_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let flipped = repo
            .mark_entity_read("user1", "video1", &EntityKind::Video)
            .await
            .unwrap();

        assert_eq!(flipped, 2);
    }

    #[tokio::test]
    async fn test_delete_expired_reports_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 5,
                }])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let removed = repo.delete_expired(Utc::now()).await.unwrap();

        assert_eq!(removed, 5);
    }
}
