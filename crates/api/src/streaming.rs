//! WebSocket streaming API.
//!
//! The [`ChannelRegistry`] maps logical rooms (`video_<id>`, `user_<id>`,
//! `notification_<id>`) to broadcast channels and multiplexes published
//! events to every connected member of a room. It is constructed explicitly
//! in the server binary and handed to request handlers and core services by
//! reference; there is no process-wide singleton.

#![allow(missing_docs)]

use async_trait::async_trait;
use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use clipstream_common::AppResult;
use clipstream_core::{EventPublisher, rooms};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::broadcast;
use tokio_stream::{StreamMap, wrappers::BroadcastStream};
use tracing::{debug, info, warn};

use crate::middleware::AppState;

/// An event broadcast into a room.
#[derive(Debug, Clone, Serialize)]
pub struct RoomEvent {
    /// Event name, e.g. `newComment`.
    pub event: String,
    /// Event payload.
    pub data: serde_json::Value,
}

/// Room-keyed broadcast registry.
///
/// Delivery is best effort to currently connected members: publishing into
/// a room nobody watches drops the event, and lagged receivers skip what
/// they missed.
pub struct ChannelRegistry {
    capacity: usize,
    rooms: RwLock<HashMap<String, broadcast::Sender<RoomEvent>>>,
}

impl ChannelRegistry {
    /// Create a new registry with the given per-room buffer capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Join a room, creating it on first subscription.
    pub fn subscribe(&self, room_id: &str) -> broadcast::Receiver<RoomEvent> {
        let mut rooms = match self.rooms.write() {
            Ok(rooms) => rooms,
            Err(poisoned) => poisoned.into_inner(),
        };
        rooms
            .entry(room_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Broadcast `payload` as `event` to all current members of a room.
    /// Returns the number of receivers the event reached.
    pub fn publish_to_room(
        &self,
        room_id: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> usize {
        let sender = {
            let rooms = match self.rooms.read() {
                Ok(rooms) => rooms,
                Err(poisoned) => poisoned.into_inner(),
            };
            rooms.get(room_id).cloned()
        };

        let Some(sender) = sender else {
            return 0;
        };

        match sender.send(RoomEvent {
            event: event.to_string(),
            data: payload,
        }) {
            Ok(receivers) => receivers,
            Err(_) => {
                // Everyone left between lookup and send.
                self.prune(room_id);
                0
            }
        }
    }

    /// Drop a room's channel once its last receiver is gone.
    pub fn prune(&self, room_id: &str) {
        let mut rooms = match self.rooms.write() {
            Ok(rooms) => rooms,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(sender) = rooms.get(room_id)
            && sender.receiver_count() == 0
        {
            rooms.remove(room_id);
        }
    }

    /// Number of rooms currently held.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms
            .read()
            .map(|rooms| rooms.len())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventPublisher for ChannelRegistry {
    async fn publish(
        &self,
        room_id: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> AppResult<()> {
        let reached = self.publish_to_room(room_id, event, payload);
        debug!(room_id = %room_id, event = %event, reached, "Published room event");
        Ok(())
    }
}

/// Streaming query parameters.
#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Access token for authentication.
    #[serde(rename = "i")]
    pub token: Option<String>,
}

/// Client-to-server message.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Join a video's room.
    JoinVideo { video_id: String },
    /// Leave a video's room.
    LeaveVideo { video_id: String },
}

/// Server-to-client message.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Sent once after the handshake.
    Connected { user_id: String },
    /// A room event.
    Event {
        room: String,
        event: String,
        data: serde_json::Value,
    },
}

/// WebSocket handler for streaming.
///
/// The handshake is rejected outright when no valid credential is
/// presented; unauthenticated connections are never admitted.
pub async fn streaming_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<StreamQuery>,
    State(state): State<AppState>,
) -> Response {
    let Some(token) = query.token else {
        return (StatusCode::UNAUTHORIZED, "Missing token").into_response();
    };

    let user = match state.user_service.authenticate_by_token(&token).await {
        Ok(user) => user,
        Err(e) => {
            warn!(error = %e, "Streaming handshake rejected");
            return (StatusCode::UNAUTHORIZED, "Invalid token").into_response();
        }
    };

    info!(user_id = %user.id, "Streaming connection established");
    ws.on_upgrade(move |socket| handle_socket(socket, user, state))
}

/// Handle a WebSocket connection.
async fn handle_socket(socket: WebSocket, user: clipstream_db::entities::user::Model, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let registry = state.registry;

    // Every authenticated connection is a member of its personal room and
    // its notification feed room.
    let mut streams: StreamMap<String, BroadcastStream<RoomEvent>> = StreamMap::new();
    for room in [rooms::user(&user.id), rooms::notification(&user.id)] {
        streams.insert(room.clone(), BroadcastStream::new(registry.subscribe(&room)));
    }

    let hello = ServerMessage::Connected {
        user_id: user.id.clone(),
    };
    if let Ok(json) = serde_json::to_string(&hello)
        && sender.send(Message::Text(json.into())).await.is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            // Handle incoming messages from client
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::JoinVideo { video_id }) => {
                                let room = rooms::video(&video_id);
                                if !streams.contains_key(&room) {
                                    streams.insert(
                                        room.clone(),
                                        BroadcastStream::new(registry.subscribe(&room)),
                                    );
                                }
                                debug!(user_id = %user.id, room = %room, "Joined room");
                            }
                            Ok(ClientMessage::LeaveVideo { video_id }) => {
                                let room = rooms::video(&video_id);
                                streams.remove(&room);
                                registry.prune(&room);
                                debug!(user_id = %user.id, room = %room, "Left room");
                            }
                            Err(e) => {
                                warn!(error = %e, "Failed to parse client message");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(user_id = %user.id, "Client closed connection");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error");
                        break;
                    }
                }
            }

            // Fan room events in from every joined room
            Some((room, event)) = streams.next() => {
                match event {
                    Ok(event) => {
                        let msg = ServerMessage::Event {
                            room,
                            event: event.event,
                            data: event.data,
                        };
                        let json = serde_json::to_string(&msg).unwrap_or_default();
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        // Lagged receiver: skip missed events, keep streaming.
                        warn!(error = %e, "Dropped room events");
                    }
                }
            }
        }
    }

    // Release room membership.
    let joined: Vec<String> = streams.keys().cloned().collect();
    drop(streams);
    for room in joined {
        registry.prune(&room);
    }

    info!(user_id = %user.id, "Streaming connection closed");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_publish_without_members_reaches_nobody() {
        let registry = ChannelRegistry::new(16);
        let reached = registry.publish_to_room("video_v1", "newComment", json!({}));
        assert_eq!(reached, 0);
    }

    #[tokio::test]
    async fn test_publish_reaches_all_room_members() {
        let registry = ChannelRegistry::new(16);
        let mut rx1 = registry.subscribe("video_v1");
        let mut rx2 = registry.subscribe("video_v1");
        let mut other = registry.subscribe("video_v2");

        let reached =
            registry.publish_to_room("video_v1", "newComment", json!({ "commentId": "c1" }));
        assert_eq!(reached, 2);

        let event = rx1.recv().await.unwrap();
        assert_eq!(event.event, "newComment");
        assert_eq!(event.data["commentId"], "c1");
        assert!(rx2.recv().await.is_ok());
        assert!(other.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_prune_removes_empty_rooms() {
        let registry = ChannelRegistry::new(16);
        let rx = registry.subscribe("video_v1");
        assert_eq!(registry.room_count(), 1);

        drop(rx);
        registry.prune("video_v1");
        assert_eq!(registry.room_count(), 0);
    }

    #[tokio::test]
    async fn test_prune_keeps_occupied_rooms() {
        let registry = ChannelRegistry::new(16);
        let _rx = registry.subscribe("video_v1");
        registry.prune("video_v1");
        assert_eq!(registry.room_count(), 1);
    }

    #[tokio::test]
    async fn test_event_publisher_trait_roundtrip() {
        let registry = ChannelRegistry::new(16);
        let mut rx = registry.subscribe("notification_u1");

        EventPublisher::publish(
            &registry,
            "notification_u1",
            "notification:newVideo",
            json!({ "isRead": false }),
        )
        .await
        .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event, "notification:newVideo");
        assert_eq!(event.data["isRead"], false);
    }

    #[test]
    fn test_client_message_parsing() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"join-video","body":{"videoId":"v1"}}"#).unwrap();
        assert!(matches!(msg, ClientMessage::JoinVideo { video_id } if video_id == "v1"));
    }
}
