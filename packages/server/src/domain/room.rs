//! Durable room metadata owned by the external store.
//!
//! The gateway's own room state is a volatile runtime projection (see
//! `infrastructure::rooms`); this metadata is read at join time to authorize
//! room access.

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Lifecycle status of a support conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Open,
    Closed,
}

/// Durable participant record for a room, loaded from the external store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomMetadata {
    /// The customer who opened the conversation.
    pub customer_id: UserId,
    /// The support agent assigned to it, if any.
    pub assigned_agent_id: Option<UserId>,
    pub status: RoomStatus,
}

impl RoomMetadata {
    /// Whether `user` is allowed to join the room: only the room's customer
    /// or its assigned agent, and only while the room is open.
    pub fn authorizes(&self, user: &UserId) -> bool {
        if self.status == RoomStatus::Closed {
            return false;
        }
        self.customer_id == *user || self.assigned_agent_id.as_ref() == Some(user)
    }
}
