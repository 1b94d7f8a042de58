//! Connection registry: one record per live connection.
//!
//! The registry is the single writer of the per-connection view (identity,
//! joined-room set, last activity). Room membership itself is owned by the
//! room directory; use cases keep the two consistent by updating the
//! directory first on join and the registry first on leave, so the
//! per-connection view is always a subset of directory membership.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;

use helpdesk_shared::time::Clock;

use crate::domain::{ConnectionId, RoomId, UserId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("connection '{0}' is already registered")]
    DuplicateConnection(ConnectionId),
}

/// Per-connection record. Created on connect, destroyed on disconnect.
#[derive(Debug, Clone)]
pub struct ConnectionRecord {
    /// Authenticated identity, or `None` for a guest connection.
    pub user_id: Option<UserId>,
    /// Rooms this connection has joined (per-connection view).
    pub joined_rooms: HashSet<RoomId>,
    /// Unix timestamp (milliseconds) of registration.
    pub connected_at: i64,
    /// Unix timestamp (milliseconds) of the last inbound event.
    pub last_activity: i64,
}

/// Tracks each live connection and its authenticated identity.
pub struct ConnectionRegistry {
    clock: Arc<dyn Clock>,
    connections: Mutex<HashMap<ConnectionId, ConnectionRecord>>,
}

impl ConnectionRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Create a record for a new connection.
    pub async fn register(
        &self,
        connection_id: ConnectionId,
        user_id: Option<UserId>,
    ) -> Result<(), RegistryError> {
        let now = self.clock.now_millis();
        let mut connections = self.connections.lock().await;
        if connections.contains_key(&connection_id) {
            return Err(RegistryError::DuplicateConnection(connection_id));
        }
        connections.insert(
            connection_id,
            ConnectionRecord {
                user_id,
                joined_rooms: HashSet::new(),
                connected_at: now,
                last_activity: now,
            },
        );
        Ok(())
    }

    /// Remove the connection's record, returning it so the caller can run
    /// the room-leave and presence cascade. Idempotent: unregistering an
    /// unknown id returns `None`.
    pub async fn unregister(&self, connection_id: &ConnectionId) -> Option<ConnectionRecord> {
        let mut connections = self.connections.lock().await;
        connections.remove(connection_id)
    }

    /// Update the last-activity timestamp. Used for liveness.
    pub async fn touch(&self, connection_id: &ConnectionId) {
        let now = self.clock.now_millis();
        let mut connections = self.connections.lock().await;
        if let Some(record) = connections.get_mut(connection_id) {
            record.last_activity = now;
        }
    }

    pub async fn lookup(&self, connection_id: &ConnectionId) -> Option<ConnectionRecord> {
        let connections = self.connections.lock().await;
        connections.get(connection_id).cloned()
    }

    /// Record that the connection joined a room. Called after the room
    /// directory accepted the join.
    pub async fn note_joined(&self, connection_id: &ConnectionId, room_id: RoomId) {
        let mut connections = self.connections.lock().await;
        if let Some(record) = connections.get_mut(connection_id) {
            record.joined_rooms.insert(room_id);
        }
    }

    /// Record that the connection left a room. Called before the room
    /// directory drops the membership.
    pub async fn note_left(&self, connection_id: &ConnectionId, room_id: &RoomId) {
        let mut connections = self.connections.lock().await;
        if let Some(record) = connections.get_mut(connection_id) {
            record.joined_rooms.remove(room_id);
        }
    }

    /// Connections whose last activity is older than `window`.
    pub async fn stale_connections(&self, window: Duration) -> Vec<ConnectionId> {
        let cutoff = self.clock.now_millis() - window.as_millis() as i64;
        let connections = self.connections.lock().await;
        connections
            .iter()
            .filter(|(_, record)| record.last_activity < cutoff)
            .map(|(id, _)| *id)
            .collect()
    }

    pub async fn count(&self) -> usize {
        let connections = self.connections.lock().await;
        connections.len()
    }
}
