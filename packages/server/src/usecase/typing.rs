//! UseCase: typing indicator transitions.
//!
//! Only state transitions are broadcast: repeated typing signals while
//! already typing refresh the deadline silently. The sweep is driven by a
//! periodic server task and broadcasts the stop for every indicator whose
//! deadline has passed without an explicit stop.

use std::sync::Arc;

use crate::domain::{ConnectionId, RoomId};
use crate::infrastructure::dto::websocket::ServerEvent;
use crate::infrastructure::presence::PresenceTracker;
use crate::infrastructure::registry::ConnectionRegistry;
use crate::infrastructure::rooms::RoomDirectory;

use super::error::TypingError;

pub struct TypingUseCase {
    registry: Arc<ConnectionRegistry>,
    rooms: Arc<RoomDirectory>,
    presence: Arc<PresenceTracker>,
}

impl TypingUseCase {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        rooms: Arc<RoomDirectory>,
        presence: Arc<PresenceTracker>,
    ) -> Self {
        Self {
            registry,
            rooms,
            presence,
        }
    }

    pub async fn set_typing(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
    ) -> Result<(), TypingError> {
        let user_id = self.authorize(connection_id, room_id).await?;
        if self.presence.set_typing(room_id, &user_id).await {
            self.broadcast_typing(room_id, &user_id.to_string(), true, Some(connection_id))
                .await;
        }
        Ok(())
    }

    pub async fn clear_typing(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
    ) -> Result<(), TypingError> {
        let user_id = self.authorize(connection_id, room_id).await?;
        if self.presence.clear_typing(room_id, &user_id).await {
            self.broadcast_typing(room_id, &user_id.to_string(), false, Some(connection_id))
                .await;
        }
        Ok(())
    }

    /// Expire indicators whose deadline has passed and broadcast the stop
    /// for each. Returns the number of expired indicators.
    pub async fn sweep_expired(&self) -> usize {
        let expired = self.presence.expire_stale().await;
        for (room_id, user_id) in &expired {
            tracing::debug!(room = %room_id, user = %user_id, "typing indicator expired");
            self.broadcast_typing(room_id, &user_id.to_string(), false, None)
                .await;
        }
        expired.len()
    }

    async fn authorize(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
    ) -> Result<crate::domain::UserId, TypingError> {
        let record = self
            .registry
            .lookup(connection_id)
            .await
            .ok_or(TypingError::UnknownConnection)?;
        let user_id = record.user_id.ok_or(TypingError::NotAMember)?;
        if !self.rooms.is_member(room_id, connection_id).await {
            return Err(TypingError::NotAMember);
        }
        Ok(user_id)
    }

    async fn broadcast_typing(
        &self,
        room_id: &RoomId,
        user_id: &str,
        typing: bool,
        exclude: Option<&ConnectionId>,
    ) {
        let event = ServerEvent::PresenceTyping {
            room_id: room_id.to_string(),
            user_id: user_id.to_string(),
            typing,
        };
        self.rooms.broadcast(room_id, &event.to_json(), exclude).await;
    }
}
