//! Subscription service.

use crate::services::event_publisher::{EventPublisherService, rooms};
use crate::services::user::AuthorProjection;
use clipstream_common::{AppError, AppResult, IdGenerator};
use clipstream_db::{
    entities::subscription,
    repositories::{SubscriptionRepository, UserRepository},
};
use sea_orm::Set;
use serde_json::json;

/// How a toggle call resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionToggle {
    /// A new subscription was created.
    Subscribed,
    /// The existing subscription was removed.
    Unsubscribed,
}

/// Subscription service for business logic.
#[derive(Clone)]
pub struct SubscriptionService {
    subscription_repo: SubscriptionRepository,
    user_repo: UserRepository,
    event_publisher: Option<EventPublisherService>,
    id_gen: IdGenerator,
}

impl SubscriptionService {
    /// Create a new subscription service.
    #[must_use]
    pub const fn new(
        subscription_repo: SubscriptionRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            subscription_repo,
            user_repo,
            event_publisher: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Toggle a subscription to a channel.
    ///
    /// Emits paired events: the channel owner's personal room hears
    /// `subscriber:update`, the subscriber's personal room hears
    /// `subscription:update`.
    pub async fn toggle(
        &self,
        subscriber_id: &str,
        channel_id: &str,
    ) -> AppResult<SubscriptionToggle> {
        if subscriber_id == channel_id {
            return Err(AppError::Validation(
                "You can not subscribe to yourself".to_string(),
            ));
        }

        // The channel must resolve to a user.
        self.user_repo.get_by_id(channel_id).await?;

        let existing = self
            .subscription_repo
            .find_by_pair(subscriber_id, channel_id)
            .await?;

        if let Some(subscription) = existing {
            self.subscription_repo.delete(subscription).await?;
            self.user_repo.decrement_subscribers_count(channel_id).await?;

            self.publish(
                &rooms::user(channel_id),
                "subscriber:update",
                json!({ "subscriberId": subscriber_id, "action": "UNSUBSCRIBE" }),
            )
            .await;
            self.publish(
                &rooms::user(subscriber_id),
                "subscription:update",
                json!({ "channelId": channel_id, "action": "DECREMENT" }),
            )
            .await;

            tracing::debug!(subscriber_id = %subscriber_id, channel_id = %channel_id, "Unsubscribed");
            return Ok(SubscriptionToggle::Unsubscribed);
        }

        let model = subscription::ActiveModel {
            id: Set(self.id_gen.generate()),
            subscriber_id: Set(subscriber_id.to_string()),
            channel_id: Set(channel_id.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };
        self.subscription_repo.create(model).await?;
        self.user_repo.increment_subscribers_count(channel_id).await?;

        self.publish(
            &rooms::user(channel_id),
            "subscriber:update",
            json!({ "subscriberId": subscriber_id, "action": "SUBSCRIBE" }),
        )
        .await;
        self.publish(
            &rooms::user(subscriber_id),
            "subscription:update",
            json!({ "channelId": channel_id, "action": "INCREMENT" }),
        )
        .await;

        tracing::debug!(subscriber_id = %subscriber_id, channel_id = %channel_id, "Subscribed");
        Ok(SubscriptionToggle::Subscribed)
    }

    /// Get a channel's subscribers with user projections.
    pub async fn subscribers(&self, channel_id: &str) -> AppResult<Vec<AuthorProjection>> {
        let subscriptions = self.subscription_repo.find_by_channel(channel_id).await?;
        let subscriber_ids: Vec<String> = subscriptions
            .iter()
            .map(|s| s.subscriber_id.clone())
            .collect();

        let users = self.user_repo.find_by_ids(&subscriber_ids).await?;
        Ok(users.iter().map(AuthorProjection::from).collect())
    }

    /// Get the channels a user is subscribed to, with user projections.
    pub async fn subscribed_channels(
        &self,
        subscriber_id: &str,
    ) -> AppResult<Vec<AuthorProjection>> {
        let subscriptions = self
            .subscription_repo
            .find_by_subscriber(subscriber_id)
            .await?;
        let channel_ids: Vec<String> = subscriptions
            .iter()
            .map(|s| s.channel_id.clone())
            .collect();

        let users = self.user_repo.find_by_ids(&channel_ids).await?;
        Ok(users.iter().map(AuthorProjection::from).collect())
    }

    /// Whether a user is subscribed to a channel.
    pub async fn status(&self, subscriber_id: &str, channel_id: &str) -> AppResult<bool> {
        self.subscription_repo
            .is_subscribed(subscriber_id, channel_id)
            .await
    }

    async fn publish(&self, room: &str, event: &str, payload: serde_json::Value) {
        if let Some(ref event_publisher) = self.event_publisher {
            if let Err(e) = event_publisher.publish(room, event, payload).await {
                tracing::warn!(error = %e, room = %room, event = %event, "Failed to publish room event");
            }
        }
    }
}
