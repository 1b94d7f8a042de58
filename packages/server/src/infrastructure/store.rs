//! In-memory `MessageStore` implementation.
//!
//! Stands in for the external persistence service in development and tests.
//! Durable room records are seeded explicitly; messages accumulate in an
//! append-only log inspectable from tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{
    ChatMessage, MessageStore, RoomId, RoomMetadata, StorageError, StoredMessageId,
};

pub struct InMemoryMessageStore {
    rooms: Mutex<HashMap<RoomId, RoomMetadata>>,
    messages: Mutex<Vec<ChatMessage>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            messages: Mutex::new(Vec::new()),
        }
    }

    /// Seed a durable room record.
    pub async fn seed_room(&self, room_id: RoomId, metadata: RoomMetadata) {
        let mut rooms = self.rooms.lock().await;
        rooms.insert(room_id, metadata);
    }

    /// Snapshot of every persisted message, in save order.
    pub async fn saved_messages(&self) -> Vec<ChatMessage> {
        let messages = self.messages.lock().await;
        messages.clone()
    }
}

impl Default for InMemoryMessageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn save_message(&self, message: &ChatMessage) -> Result<StoredMessageId, StorageError> {
        {
            let rooms = self.rooms.lock().await;
            if !rooms.contains_key(&message.room_id) {
                return Err(StorageError::RoomNotFound(message.room_id.to_string()));
            }
        }
        let mut messages = self.messages.lock().await;
        messages.push(message.clone());
        Ok(Uuid::new_v4().to_string())
    }

    async fn load_room_metadata(&self, room_id: &RoomId) -> Result<RoomMetadata, StorageError> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| StorageError::RoomNotFound(room_id.to_string()))
    }
}
