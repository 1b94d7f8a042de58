//! UseCase: accept a new connection.
//!
//! Registers the (already authenticated or guest) connection with the
//! registry and hands its outbound channel to the pusher. The connection id
//! is generated here; clients never supply one.

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, PusherChannel, UserId};
use crate::infrastructure::registry::{ConnectionRegistry, RegistryError};

use super::error::ConnectError;

pub struct ConnectSessionUseCase {
    registry: Arc<ConnectionRegistry>,
    pusher: Arc<dyn MessagePusher>,
}

impl ConnectSessionUseCase {
    pub fn new(registry: Arc<ConnectionRegistry>, pusher: Arc<dyn MessagePusher>) -> Self {
        Self { registry, pusher }
    }

    /// Register a new connection. Returns the generated connection id.
    pub async fn execute(
        &self,
        user_id: Option<UserId>,
        sender: PusherChannel,
    ) -> Result<ConnectionId, ConnectError> {
        let connection_id = ConnectionId::generate();
        self.registry
            .register(connection_id, user_id.clone())
            .await
            .map_err(|RegistryError::DuplicateConnection(id)| {
                ConnectError::DuplicateConnection(id)
            })?;
        self.pusher.register(connection_id, sender).await;

        match &user_id {
            Some(user) => {
                tracing::info!(connection = %connection_id, user = %user, "connection registered")
            }
            None => {
                tracing::info!(connection = %connection_id, "guest connection registered")
            }
        }
        Ok(connection_id)
    }
}
