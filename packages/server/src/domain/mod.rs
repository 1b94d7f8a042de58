//! Domain layer: value objects, entities, error types and the trait seams
//! to external collaborators.
//!
//! The domain layer defines the interfaces it needs (`MessageStore`,
//! `AuthVerifier`, `NotificationDispatcher`, `MessagePusher`); the
//! infrastructure layer provides the implementations (dependency inversion).

mod error;
mod id;
mod message;
mod ports;
mod room;

pub use error::{AuthError, PayloadError, PushError, StorageError};
pub use id::{ConnectionId, InvalidIdError, MessageId, RoomId, UserId};
pub use message::{ChatMessage, MessageContent, MessageKind};
pub use ports::{
    AuthVerifier, MessagePusher, MessageStore, NotificationDispatcher, PusherChannel,
    StoredMessageId,
};
pub use room::{RoomMetadata, RoomStatus};

#[cfg(test)]
pub use ports::MockMessageStore;
