//! UseCase: relay a chat message to a room.
//!
//! Delivery comes first: the message is stamped with its id and timestamp,
//! fanned out to every current member (sender included), and only then
//! handed to the store. A storage failure is reported to the sender alone
//! as a delivery-status event; it never retracts the broadcast.

use std::sync::Arc;

use helpdesk_shared::time::Clock;

use crate::domain::{
    ChatMessage, ConnectionId, MessageContent, MessageKind, MessagePusher, MessageStore,
    NotificationDispatcher, RoomId,
};
use crate::infrastructure::dto::websocket::ServerEvent;
use crate::infrastructure::presence::PresenceTracker;
use crate::infrastructure::registry::ConnectionRegistry;
use crate::infrastructure::rooms::RoomDirectory;

use super::error::SendMessageError;

pub struct SendMessageUseCase {
    clock: Arc<dyn Clock>,
    registry: Arc<ConnectionRegistry>,
    rooms: Arc<RoomDirectory>,
    presence: Arc<PresenceTracker>,
    pusher: Arc<dyn MessagePusher>,
    store: Arc<dyn MessageStore>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl SendMessageUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        clock: Arc<dyn Clock>,
        registry: Arc<ConnectionRegistry>,
        rooms: Arc<RoomDirectory>,
        presence: Arc<PresenceTracker>,
        pusher: Arc<dyn MessagePusher>,
        store: Arc<dyn MessageStore>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            clock,
            registry,
            rooms,
            presence,
            pusher,
            store,
            notifier,
        }
    }

    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
        payload: String,
        kind: MessageKind,
        local_id: Option<String>,
    ) -> Result<(), SendMessageError> {
        let record = self
            .registry
            .lookup(connection_id)
            .await
            .ok_or(SendMessageError::UnknownConnection)?;
        let user_id = record.user_id.ok_or(SendMessageError::NotAMember)?;
        if !self.rooms.is_member(room_id, connection_id).await {
            return Err(SendMessageError::NotAMember);
        }

        let content = MessageContent::new(payload, kind)?;
        let message = ChatMessage::new(
            room_id.clone(),
            user_id.clone(),
            content,
            kind,
            self.clock.now_millis(),
        );

        // Sending is an implicit stop-typing.
        if self.presence.clear_typing(room_id, &user_id).await {
            let event = ServerEvent::PresenceTyping {
                room_id: room_id.to_string(),
                user_id: user_id.to_string(),
                typing: false,
            };
            self.rooms
                .broadcast(room_id, &event.to_json(), Some(connection_id))
                .await;
        }

        let event = ServerEvent::from(&message);
        let delivered = self.rooms.broadcast(room_id, &event.to_json(), None).await;
        tracing::debug!(
            room = %room_id,
            message = %message.id,
            delivered,
            "message relayed"
        );

        // Notification follows the broadcast, not persistence: offline
        // participants hear about a delivered message even if storage is down.
        self.notifier.notify(room_id, &message).await;

        match self.store.save_message(&message).await {
            Ok(stored_id) => {
                tracing::debug!(message = %message.id, stored = %stored_id, "message persisted");
            }
            Err(e) => {
                tracing::error!(message = %message.id, error = %e, "message persistence failed");
                let failure = ServerEvent::DeliveryFailed {
                    local_id,
                    reason: e.to_string(),
                };
                if let Err(push_err) = self.pusher.push_to(connection_id, &failure.to_json()).await
                {
                    tracing::warn!(
                        connection = %connection_id,
                        error = %push_err,
                        "could not report delivery failure to sender"
                    );
                }
            }
        }

        Ok(())
    }
}
