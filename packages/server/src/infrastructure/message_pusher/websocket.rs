//! WebSocket-backed `MessagePusher`.
//!
//! Owns the bounded per-connection send channels. The WebSocket itself is
//! accepted in the UI layer (`ui::handler::websocket`), which registers the
//! channel here; this implementation only hands serialized events to each
//! connection's pusher task.
//!
//! Sends use `try_send`: a connection whose queue is full drops the event
//! (counted and logged) instead of stalling the fan-out loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use crate::domain::{ConnectionId, MessagePusher, PushError, PusherChannel};

pub struct WebSocketMessagePusher {
    clients: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>,
    dropped: AtomicU64,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self {
            clients: Arc::new(Mutex::new(HashMap::new())),
            dropped: AtomicU64::new(0),
        }
    }

    /// Total events dropped because a connection's queue was full.
    pub fn dropped_total(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for WebSocketMessagePusher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        clients.insert(connection_id, sender);
        tracing::debug!(connection = %connection_id, "connection registered to pusher");
    }

    async fn unregister(&self, connection_id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        clients.remove(connection_id);
        tracing::debug!(connection = %connection_id, "connection unregistered from pusher");
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), PushError> {
        let clients = self.clients.lock().await;
        let Some(sender) = clients.get(connection_id) else {
            return Err(PushError::ConnectionNotFound(connection_id.to_string()));
        };
        match sender.try_send(content.to_string()) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(PushError::QueueFull(connection_id.to_string()))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                Err(PushError::ConnectionClosed(connection_id.to_string()))
            }
        }
    }
}
