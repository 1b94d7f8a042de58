//! Log-only `NotificationDispatcher` implementation.
//!
//! The production dispatcher (push/email to offline participants) is an
//! external service; this stand-in records the intent in the logs.

use async_trait::async_trait;

use crate::domain::{ChatMessage, NotificationDispatcher, RoomId};

#[derive(Default)]
pub struct LogNotificationDispatcher;

impl LogNotificationDispatcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationDispatcher for LogNotificationDispatcher {
    async fn notify(&self, room_id: &RoomId, message: &ChatMessage) {
        tracing::debug!(
            room = %room_id,
            message_id = %message.id,
            sender = %message.sender_user_id,
            "offline-participant notification emitted"
        );
    }
}
