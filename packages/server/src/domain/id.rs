//! Identifier value objects.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error returned when a string-backed identifier fails validation.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid {kind}: {reason}")]
pub struct InvalidIdError {
    kind: &'static str,
    reason: String,
}

impl InvalidIdError {
    fn new(kind: &'static str, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

/// Unique identifier of one live connection. Generated by the gateway on
/// connect; never supplied by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a support conversation room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(String);

impl RoomId {
    const MAX_LEN: usize = 64;

    pub fn new(value: impl Into<String>) -> Result<Self, InvalidIdError> {
        let value = value.into();
        validate_identifier("room id", &value, Self::MAX_LEN)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoomId {
    type Error = InvalidIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Identifier of an authenticated user (customer or support agent).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    const MAX_LEN: usize = 64;

    pub fn new(value: impl Into<String>) -> Result<Self, InvalidIdError> {
        let value = value.into();
        validate_identifier("user id", &value, Self::MAX_LEN)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = InvalidIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Identifier of an accepted message. Assigned by the relay before broadcast
/// so every member (including the sender) observes the authoritative id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

fn validate_identifier(
    kind: &'static str,
    value: &str,
    max_len: usize,
) -> Result<(), InvalidIdError> {
    if value.is_empty() {
        return Err(InvalidIdError::new(kind, "must not be empty"));
    }
    if value.len() > max_len {
        return Err(InvalidIdError::new(
            kind,
            format!("must be at most {} bytes", max_len),
        ));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(InvalidIdError::new(
            kind,
            "must contain only ASCII alphanumerics, '-', '_' or '.'",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_accepts_valid_identifier() {
        // when:
        let result = RoomId::new("room-1");

        // then:
        assert_eq!(result.unwrap().as_str(), "room-1");
    }

    #[test]
    fn test_room_id_rejects_empty_string() {
        // when:
        let result = RoomId::new("");

        // then:
        assert!(result.is_err());
    }

    #[test]
    fn test_room_id_rejects_invalid_characters() {
        // when:
        let result = RoomId::new("room 1/../etc");

        // then:
        assert!(result.is_err());
    }

    #[test]
    fn test_room_id_rejects_overlong_identifier() {
        // given:
        let long = "a".repeat(65);

        // when:
        let result = RoomId::new(long);

        // then:
        assert!(result.is_err());
    }

    #[test]
    fn test_user_id_accepts_valid_identifier() {
        // when:
        let result = UserId::new("alice");

        // then:
        assert_eq!(result.unwrap().as_str(), "alice");
    }

    #[test]
    fn test_connection_ids_are_unique() {
        // when:
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();

        // then:
        assert_ne!(a, b);
    }
}
