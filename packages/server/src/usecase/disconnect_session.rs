//! UseCase: disconnect cascade.
//!
//! Triggered by voluntary close, protocol error, or the liveness reaper.
//! The cascade removes the outbound channel before anything else so no
//! broadcast started after this point can reach the connection, then drops
//! room memberships and presence entries, broadcasting the resulting
//! offline/stopped-typing transitions to the remaining members.
//!
//! Idempotent: a second disconnect for the same id is a no-op.

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher};
use crate::infrastructure::dto::websocket::ServerEvent;
use crate::infrastructure::presence::PresenceTracker;
use crate::infrastructure::registry::ConnectionRegistry;
use crate::infrastructure::rooms::RoomDirectory;

pub struct DisconnectSessionUseCase {
    registry: Arc<ConnectionRegistry>,
    rooms: Arc<RoomDirectory>,
    presence: Arc<PresenceTracker>,
    pusher: Arc<dyn MessagePusher>,
}

impl DisconnectSessionUseCase {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        rooms: Arc<RoomDirectory>,
        presence: Arc<PresenceTracker>,
        pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            registry,
            rooms,
            presence,
            pusher,
        }
    }

    pub async fn execute(&self, connection_id: &ConnectionId) {
        // Outbound delivery stops before the record is touched: unregister
        // happens-before any broadcast attempt targeting this connection.
        self.pusher.unregister(connection_id).await;

        let Some(record) = self.registry.unregister(connection_id).await else {
            return;
        };

        for room_id in &record.joined_rooms {
            self.rooms.leave(room_id, connection_id).await;
        }

        if let Some(user_id) = &record.user_id {
            for room_id in &record.joined_rooms {
                let outcome = self.presence.mark_offline(room_id, user_id).await;
                if outcome.was_typing {
                    let event = ServerEvent::PresenceTyping {
                        room_id: room_id.to_string(),
                        user_id: user_id.to_string(),
                        typing: false,
                    };
                    self.rooms.broadcast(room_id, &event.to_json(), None).await;
                }
                if outcome.was_online {
                    let event = ServerEvent::PresenceOffline {
                        room_id: room_id.to_string(),
                        user_id: user_id.to_string(),
                    };
                    self.rooms.broadcast(room_id, &event.to_json(), None).await;
                }
            }
        }

        tracing::info!(
            connection = %connection_id,
            rooms = record.joined_rooms.len(),
            "connection disconnected, cascade complete"
        );
    }
}
