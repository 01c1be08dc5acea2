//! Event publisher service.
//!
//! Provides an abstraction for publishing real-time events to logical rooms.
//! The actual implementation is provided by the api crate's channel registry.

use async_trait::async_trait;
use clipstream_common::AppResult;
use std::sync::Arc;

/// Room naming conventions shared by publishers and the streaming layer.
pub mod rooms {
    /// Room for everyone watching a video.
    #[must_use]
    pub fn video(video_id: &str) -> String {
        format!("video_{video_id}")
    }

    /// Personal room of an authenticated user.
    #[must_use]
    pub fn user(user_id: &str) -> String {
        format!("user_{user_id}")
    }

    /// Notification feed room of an authenticated user.
    #[must_use]
    pub fn notification(user_id: &str) -> String {
        format!("notification_{user_id}")
    }
}

/// Trait for publishing real-time events.
///
/// This allows the core services to publish events without directly
/// depending on the streaming implementation. Delivery is best effort to
/// currently connected room members; there is no persistence.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Broadcast `payload` as `event` to every current member of `room_id`.
    async fn publish(
        &self,
        room_id: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> AppResult<()>;
}

/// A no-op implementation of [`EventPublisher`] for testing or when
/// real-time events are disabled.
#[derive(Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish(
        &self,
        _room_id: &str,
        _event: &str,
        _payload: serde_json::Value,
    ) -> AppResult<()> {
        Ok(())
    }
}

/// Wrapper for boxed `EventPublisher` trait object.
pub type EventPublisherService = Arc<dyn EventPublisher>;

/// Records published events so tests can assert on them.
#[cfg(test)]
pub(crate) mod test_support {
    use super::{AppResult, EventPublisher};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// An event captured by [`RecordingEventPublisher`].
    #[derive(Debug, Clone)]
    pub struct RecordedEvent {
        pub room_id: String,
        pub event: String,
        pub payload: serde_json::Value,
    }

    #[derive(Default)]
    pub struct RecordingEventPublisher {
        events: Mutex<Vec<RecordedEvent>>,
    }

    impl RecordingEventPublisher {
        pub fn take(&self) -> Vec<RecordedEvent> {
            self.events.lock().map(|mut e| std::mem::take(&mut *e)).unwrap_or_default()
        }
    }

    #[async_trait]
    impl EventPublisher for RecordingEventPublisher {
        async fn publish(
            &self,
            room_id: &str,
            event: &str,
            payload: serde_json::Value,
        ) -> AppResult<()> {
            if let Ok(mut events) = self.events.lock() {
                events.push(RecordedEvent {
                    room_id: room_id.to_string(),
                    event: event.to_string(),
                    payload,
                });
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_room_names() {
        assert_eq!(rooms::video("v1"), "video_v1");
        assert_eq!(rooms::user("u1"), "user_u1");
        assert_eq!(rooms::notification("u1"), "notification_u1");
    }

    #[tokio::test]
    async fn test_noop_publisher() {
        let publisher = NoOpEventPublisher;
        publisher
            .publish("video_v1", "newComment", serde_json::json!({}))
            .await
            .unwrap();
    }
}
