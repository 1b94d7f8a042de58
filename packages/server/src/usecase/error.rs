//! Error types returned by the use cases.
//!
//! Validation errors are reported back to the originating connection only
//! and never broadcast; the handler maps each variant to a wire error code.

use thiserror::Error;

use crate::domain::{ConnectionId, PayloadError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConnectError {
    #[error("connection '{0}' is already registered")]
    DuplicateConnection(ConnectionId),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JoinRoomError {
    #[error("connection is not registered")]
    UnknownConnection,
    #[error("room access denied")]
    Forbidden,
    #[error("room not found")]
    RoomNotFound,
    #[error("room metadata unavailable: {0}")]
    Storage(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LeaveRoomError {
    #[error("connection is not registered")]
    UnknownConnection,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendMessageError {
    #[error("connection is not registered")]
    UnknownConnection,
    #[error("sender is not a member of the room")]
    NotAMember,
    #[error(transparent)]
    InvalidPayload(#[from] PayloadError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypingError {
    #[error("connection is not registered")]
    UnknownConnection,
    #[error("user is not a member of the room")]
    NotAMember,
}
