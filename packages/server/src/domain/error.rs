//! Domain-level error types shared across components.

use thiserror::Error;

/// Credential verification failure reported by the `AuthVerifier`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid credential token")]
    InvalidToken,
    #[error("credential token expired")]
    TokenExpired,
}

/// Persistence failure reported by the `MessageStore`.
///
/// Storage failures on `save_message` are non-fatal to delivery: the message
/// has already been broadcast when persistence runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Outbound delivery failure for a single connection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PushError {
    #[error("connection '{0}' is not registered")]
    ConnectionNotFound(String),
    #[error("outbound queue full for connection '{0}'")]
    QueueFull(String),
    #[error("connection '{0}' is gone")]
    ConnectionClosed(String),
}

/// Message payload validation failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("payload must not be empty")]
    Empty,
    #[error("payload exceeds the maximum of {max} bytes")]
    TooLong { max: usize },
    #[error("the 'system' message kind is reserved for the server")]
    SystemKindReserved,
}
