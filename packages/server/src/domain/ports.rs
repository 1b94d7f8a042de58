//! Trait seams to external collaborators.
//!
//! The domain layer defines the interfaces it needs; the infrastructure
//! layer (or the embedding service) provides the implementations.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::error::{AuthError, PushError, StorageError};
use super::id::{ConnectionId, RoomId, UserId};
use super::message::ChatMessage;
use super::room::RoomMetadata;

/// Identifier assigned by the external store to a persisted message.
pub type StoredMessageId = String;

/// Bounded outbound channel carrying serialized events to one connection's
/// pusher task. Bounded so one slow client drops instead of stalling.
pub type PusherChannel = mpsc::Sender<String>;

/// External persistence store for messages and durable room records.
///
/// `save_message` failures are surfaced to the sender as a delivery-status
/// event but never retract an already-performed broadcast.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn save_message(&self, message: &ChatMessage) -> Result<StoredMessageId, StorageError>;

    /// Load the durable participant record for a room. Read at join time to
    /// authorize room access.
    async fn load_room_metadata(&self, room_id: &RoomId) -> Result<RoomMetadata, StorageError>;
}

/// External credential verifier used by the gateway at connect time.
///
/// Verification must validate signature and expiry; an identity is never
/// attached from an unverified token.
#[async_trait]
pub trait AuthVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<UserId, AuthError>;
}

/// External fire-and-forget dispatcher notifying offline room participants
/// (push/email) after a successful broadcast.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify(&self, room_id: &RoomId, message: &ChatMessage);
}

/// Outbound delivery seam: owns the per-connection send channels.
///
/// `push_to` must be non-blocking with respect to the receiving client; a
/// full queue is a per-connection failure, not a stall.
#[async_trait]
pub trait MessagePusher: Send + Sync {
    async fn register(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// Remove the connection's channel. After this returns, no further push
    /// can reach the connection.
    async fn unregister(&self, connection_id: &ConnectionId);

    async fn push_to(&self, connection_id: &ConnectionId, content: &str)
    -> Result<(), PushError>;
}
