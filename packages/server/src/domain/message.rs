//! Chat message entity and payload validation.

use serde::{Deserialize, Serialize};

use super::error::PayloadError;
use super::id::{MessageId, RoomId, UserId};

/// Kind of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Plain text typed by a participant.
    Text,
    /// Reference to an uploaded file (the payload carries the reference).
    File,
    /// Server-generated notice. Never accepted from clients.
    System,
}

/// Validated message payload.
///
/// For `Text` the content is the message body; for `File` it is the file
/// reference handed out by the upload service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent(String);

impl MessageContent {
    /// Maximum text body size in bytes.
    pub const MAX_TEXT_LEN: usize = 4096;
    /// Maximum file reference size in bytes.
    pub const MAX_FILE_REF_LEN: usize = 1024;

    /// Validate a raw payload for the given message kind.
    pub fn new(raw: impl Into<String>, kind: MessageKind) -> Result<Self, PayloadError> {
        let raw = raw.into();
        let max = match kind {
            MessageKind::Text => Self::MAX_TEXT_LEN,
            MessageKind::File => Self::MAX_FILE_REF_LEN,
            MessageKind::System => return Err(PayloadError::SystemKindReserved),
        };
        if raw.trim().is_empty() {
            return Err(PayloadError::Empty);
        }
        if raw.len() > max {
            return Err(PayloadError::TooLong { max });
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A message accepted by the relay. Immutable once accepted: id and
/// timestamp are assigned here and broadcast as-is to every room member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub room_id: RoomId,
    pub sender_user_id: UserId,
    pub content: MessageContent,
    pub kind: MessageKind,
    /// Unix timestamp in milliseconds (UTC).
    pub created_at: i64,
}

impl ChatMessage {
    pub fn new(
        room_id: RoomId,
        sender_user_id: UserId,
        content: MessageContent,
        kind: MessageKind,
        created_at: i64,
    ) -> Self {
        Self {
            id: MessageId::generate(),
            room_id,
            sender_user_id,
            content,
            kind,
            created_at,
        }
    }
}
