//! Subscription repository.

use std::sync::Arc;

use crate::entities::{Subscription, subscription};
use clipstream_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

/// Subscription repository for database operations.
#[derive(Clone)]
pub struct SubscriptionRepository {
    db: Arc<DatabaseConnection>,
}

impl SubscriptionRepository {
    /// Create a new subscription repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a subscription by subscriber and channel.
    pub async fn find_by_pair(
        &self,
        subscriber_id: &str,
        channel_id: &str,
    ) -> AppResult<Option<subscription::Model>> {
        Subscription::find()
            .filter(subscription::Column::SubscriberId.eq(subscriber_id))
            .filter(subscription::Column::ChannelId.eq(channel_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user is subscribed to a channel.
    pub async fn is_subscribed(&self, subscriber_id: &str, channel_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(subscriber_id, channel_id).await?.is_some())
    }

    /// Create a new subscription.
    pub async fn create(
        &self,
        model: subscription::ActiveModel,
    ) -> AppResult<subscription::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a subscription.
    pub async fn delete(&self, model: subscription::Model) -> AppResult<()> {
        model
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get the subscriber IDs of a channel (the fan-out audience).
    pub async fn find_subscriber_ids(&self, channel_id: &str) -> AppResult<Vec<String>> {
        Subscription::find()
            .select_only()
            .column(subscription::Column::SubscriberId)
            .filter(subscription::Column::ChannelId.eq(channel_id))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get subscriptions to a channel (newest first).
    pub async fn find_by_channel(
        &self,
        channel_id: &str,
    ) -> AppResult<Vec<subscription::Model>> {
        Subscription::find()
            .filter(subscription::Column::ChannelId.eq(channel_id))
            .order_by_desc(subscription::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user's subscriptions (newest first).
    pub async fn find_by_subscriber(
        &self,
        subscriber_id: &str,
    ) -> AppResult<Vec<subscription::Model>> {
        Subscription::find()
            .filter(subscription::Column::SubscriberId.eq(subscriber_id))
            .order_by_desc(subscription::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count subscribers of a channel.
    pub async fn count_by_channel(&self, channel_id: &str) -> AppResult<u64> {
        Subscription::find()
            .filter(subscription::Column::ChannelId.eq(channel_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
