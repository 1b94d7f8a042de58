//! WebSocket protocol DTOs: JSON events tagged by `"type"`.

use serde::{Deserialize, Serialize};

use crate::domain::{ChatMessage, MessageKind};

/// Inbound event sent by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "join", rename_all = "camelCase")]
    Join { room_id: String },

    #[serde(rename = "leave", rename_all = "camelCase")]
    Leave { room_id: String },

    #[serde(rename = "message", rename_all = "camelCase")]
    Message {
        room_id: String,
        payload: String,
        kind: MessageKind,
        /// Client-side correlation id, echoed back on delivery failure.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        local_id: Option<String>,
    },

    #[serde(rename = "typing", rename_all = "camelCase")]
    Typing { room_id: String },

    #[serde(rename = "stopTyping", rename_all = "camelCase")]
    StopTyping { room_id: String },

    #[serde(rename = "heartbeat")]
    Heartbeat,
}

/// Outbound event pushed to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "message.received", rename_all = "camelCase")]
    MessageReceived {
        id: String,
        room_id: String,
        sender_user_id: String,
        payload: String,
        kind: MessageKind,
        /// Unix timestamp in milliseconds (UTC).
        created_at: i64,
    },

    #[serde(rename = "presence.typing", rename_all = "camelCase")]
    PresenceTyping {
        room_id: String,
        user_id: String,
        typing: bool,
    },

    #[serde(rename = "presence.online", rename_all = "camelCase")]
    PresenceOnline { room_id: String, user_id: String },

    #[serde(rename = "presence.offline", rename_all = "camelCase")]
    PresenceOffline { room_id: String, user_id: String },

    #[serde(rename = "message.deliveryFailed", rename_all = "camelCase")]
    DeliveryFailed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        local_id: Option<String>,
        reason: String,
    },

    #[serde(rename = "error", rename_all = "camelCase")]
    Error { code: String, detail: String },

    #[serde(rename = "ack", rename_all = "camelCase")]
    Ack { event: String, room_id: String },
}

impl ServerEvent {
    /// Serialize to the wire representation. Serialization of these
    /// variants cannot fail.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("ServerEvent serialization cannot fail")
    }
}

impl From<&ChatMessage> for ServerEvent {
    fn from(message: &ChatMessage) -> Self {
        ServerEvent::MessageReceived {
            id: message.id.to_string(),
            room_id: message.room_id.to_string(),
            sender_user_id: message.sender_user_id.to_string(),
            payload: message.content.as_str().to_string(),
            kind: message.kind,
            created_at: message.created_at,
        }
    }
}
