//! Notification service.
//!
//! Fans a qualifying event out to every subscriber of the sender's channel:
//! one persisted notification row and one real-time event per subscriber.
//! The fan-out is at-least-once and per-subscriber independent; a failed
//! write for one subscriber never drops the others, and no umbrella
//! transaction wraps the loop.

use crate::services::event_publisher::{EventPublisherService, rooms};
use clipstream_common::{AppError, AppResult, IdGenerator};
use clipstream_db::{
    entities::notification::{self, EntityKind, NotificationKind},
    entities::user,
    repositories::{NotificationRepository, SubscriptionRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    subscription_repo: SubscriptionRepository,
    event_publisher: Option<EventPublisherService>,
    id_gen: IdGenerator,
}

/// Input for a fan-out to the sender's subscribers.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FanOutInput {
    #[serde(rename = "type")]
    pub kind: NotificationKind,

    pub entity_id: String,

    pub entity_type: EntityKind,

    #[validate(length(min = 1, max = 256))]
    pub title: String,

    #[validate(length(min = 1, max = 1024))]
    pub message: String,

    pub thumbnail: Option<String>,

    pub sender_avatar: Option<String>,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(
        notification_repo: NotificationRepository,
        subscription_repo: SubscriptionRepository,
    ) -> Self {
        Self {
            notification_repo,
            subscription_repo,
            event_publisher: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Materialize one notification per subscriber of the sender's channel
    /// and push a real-time event to each subscriber's notification room.
    ///
    /// Returns the notifications that were persisted. Individual failures
    /// are logged and skipped.
    pub async fn fan_out(
        &self,
        sender: &user::Model,
        input: FanOutInput,
    ) -> AppResult<Vec<notification::Model>> {
        input.validate()?;

        if input.title.trim().is_empty() || input.message.trim().is_empty() {
            return Err(AppError::Validation(
                "Title and message are required".to_string(),
            ));
        }

        let subscriber_ids = self
            .subscription_repo
            .find_subscriber_ids(&sender.id)
            .await?;

        let mut created = Vec::with_capacity(subscriber_ids.len());

        for subscriber_id in subscriber_ids {
            let model = notification::ActiveModel {
                id: Set(self.id_gen.generate()),
                receiver_id: Set(subscriber_id.clone()),
                sender_id: Set(Some(sender.id.clone())),
                kind: Set(input.kind.clone()),
                entity_id: Set(input.entity_id.clone()),
                entity_kind: Set(input.entity_type.clone()),
                title: Set(Some(input.title.clone())),
                message: Set(Some(input.message.clone())),
                thumbnail: Set(input.thumbnail.clone()),
                sender_avatar: Set(input.sender_avatar.clone()),
                is_read: Set(false),
                created_at: Set(chrono::Utc::now().into()),
            };

            match self.notification_repo.create(model).await {
                Ok(notification) => {
                    self.publish_new_video(&subscriber_id, &notification).await;
                    created.push(notification);
                }
                Err(e) => {
                    // Best effort per subscriber; keep going.
                    tracing::warn!(
                        error = %e,
                        subscriber_id = %subscriber_id,
                        "Failed to create notification for subscriber"
                    );
                }
            }
        }

        tracing::debug!(
            sender_id = %sender.id,
            count = created.len(),
            "Fanned out notifications"
        );
        Ok(created)
    }

    async fn publish_new_video(&self, subscriber_id: &str, notification: &notification::Model) {
        let Some(ref event_publisher) = self.event_publisher else {
            return;
        };

        let payload = json!({
            "message": notification.message,
            "sender": notification.sender_id,
            "type": notification.kind.as_str(),
            "entityId": notification.entity_id,
            "entityType": notification.entity_kind.as_str(),
            "title": notification.title,
            "thumbnail": notification.thumbnail,
            "senderAvatar": notification.sender_avatar,
            "isRead": false,
        });

        if let Err(e) = event_publisher
            .publish(
                &rooms::notification(subscriber_id),
                "notification:newVideo",
                payload,
            )
            .await
        {
            tracing::warn!(
                error = %e,
                subscriber_id = %subscriber_id,
                "Failed to publish notification event"
            );
        }
    }

    /// Get a page of notifications for a receiver plus their unread count,
    /// filtered by kind and entity kind.
    pub async fn list(
        &self,
        receiver_id: &str,
        kind: &NotificationKind,
        entity_kind: &EntityKind,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<notification::Model>, u64)> {
        let notifications = self
            .notification_repo
            .find_by_receiver(receiver_id, kind, entity_kind, page, limit)
            .await?;
        let unread = self
            .notification_repo
            .count_unread(receiver_id, kind, entity_kind)
            .await?;

        Ok((notifications, unread))
    }

    /// Mark a receiver's unread notifications for an entity as read.
    ///
    /// Invoked from viewing paths, e.g. when the receiver opens a video
    /// they were notified about.
    pub async fn mark_entity_read(
        &self,
        receiver_id: &str,
        entity_id: &str,
        entity_kind: &EntityKind,
    ) -> AppResult<u64> {
        self.notification_repo
            .mark_entity_read(receiver_id, entity_id, entity_kind)
            .await
    }

    /// Remove notifications older than the retention window.
    ///
    /// Driven by the server's sweep interval; this is the only place the
    /// application deletes notification rows.
    pub async fn purge_expired(&self, retention: chrono::Duration) -> AppResult<u64> {
        let cutoff = chrono::Utc::now() - retention;
        let removed = self.notification_repo.delete_expired(cutoff).await?;
        if removed > 0 {
            tracing::debug!(removed, "Purged expired notifications");
        }
        Ok(removed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::event_publisher::test_support::RecordingEventPublisher;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_sender(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: "creator".to_string(),
            username_lower: "creator".to_string(),
            full_name: None,
            avatar_url: Some("https://cdn.example.com/a.png".to_string()),
            token: None,
            subscribers_count: 2,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_notification(id: &str, receiver_id: &str) -> notification::Model {
        notification::Model {
            id: id.to_string(),
            receiver_id: receiver_id.to_string(),
            sender_id: Some("sender1".to_string()),
            kind: NotificationKind::Upload,
            entity_id: "video1".to_string(),
            entity_kind: EntityKind::Video,
            title: Some("New video".to_string()),
            message: Some("creator uploaded a new video".to_string()),
            thumbnail: None,
            sender_avatar: None,
            is_read: false,
            created_at: Utc::now().into(),
        }
    }

    fn fan_out_input() -> FanOutInput {
        FanOutInput {
            kind: NotificationKind::Upload,
            entity_id: "video1".to_string(),
            entity_type: EntityKind::Video,
            title: "New video".to_string(),
            message: "creator uploaded a new video".to_string(),
            thumbnail: None,
            sender_avatar: None,
        }
    }

    #[tokio::test]
    async fn test_fan_out_rejects_blank_title() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = NotificationService::new(
            NotificationRepository::new(Arc::clone(&db)),
            SubscriptionRepository::new(db),
        );

        let mut input = fan_out_input();
        input.title = "  ".to_string();

        let result = service.fan_out(&create_test_sender("sender1"), input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_fan_out_creates_one_record_per_subscriber() {
        let n1 = create_test_notification("n1", "sub1");
        let n2 = create_test_notification("n2", "sub2");

        let sub_row = |id: &str| maplit::btreemap! { "subscriber_id" => sea_orm::Value::from(id) };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // subscriber id resolution
                .append_query_results([vec![sub_row("sub1"), sub_row("sub2")]])
                // two independent inserts
                .append_query_results([[n1]])
                .append_query_results([[n2]])
                .into_connection(),
        );

        let publisher = Arc::new(RecordingEventPublisher::default());
        let mut service = NotificationService::new(
            NotificationRepository::new(Arc::clone(&db)),
            SubscriptionRepository::new(db),
        );
        service.set_event_publisher(publisher.clone());

        let created = service
            .fan_out(&create_test_sender("sender1"), fan_out_input())
            .await
            .unwrap();

        assert_eq!(created.len(), 2);

        let events = publisher.take();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].room_id, "notification_sub1");
        assert_eq!(events[0].event, "notification:newVideo");
        assert_eq!(events[0].payload["type"], "UPLOAD");
        assert_eq!(events[0].payload["entityType"], "VIDEO");
        assert_eq!(events[0].payload["isRead"], false);
        assert_eq!(events[1].room_id, "notification_sub2");
    }

    #[tokio::test]
    async fn test_fan_out_no_subscribers_is_empty() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<std::collections::BTreeMap<&str, sea_orm::Value>>::new()])
                .into_connection(),
        );

        let service = NotificationService::new(
            NotificationRepository::new(Arc::clone(&db)),
            SubscriptionRepository::new(db),
        );

        let created = service
            .fan_out(&create_test_sender("sender1"), fan_out_input())
            .await
            .unwrap();

        assert!(created.is_empty());
    }
}
