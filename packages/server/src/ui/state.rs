//! Shared application state handed to the axum handlers.

use std::sync::Arc;

use crate::domain::{AuthVerifier, MessagePusher};
use crate::infrastructure::registry::ConnectionRegistry;
use crate::infrastructure::rooms::RoomDirectory;
use crate::usecase::{
    ConnectSessionUseCase, DisconnectSessionUseCase, JoinRoomUseCase, LeaveRoomUseCase,
    SendMessageUseCase, TypingUseCase,
};

pub struct AppState {
    pub connect_usecase: Arc<ConnectSessionUseCase>,
    pub disconnect_usecase: Arc<DisconnectSessionUseCase>,
    pub join_usecase: Arc<JoinRoomUseCase>,
    pub leave_usecase: Arc<LeaveRoomUseCase>,
    pub send_usecase: Arc<SendMessageUseCase>,
    pub typing_usecase: Arc<TypingUseCase>,
    pub registry: Arc<ConnectionRegistry>,
    pub rooms: Arc<RoomDirectory>,
    pub pusher: Arc<dyn MessagePusher>,
    pub auth: Arc<dyn AuthVerifier>,
    /// Capacity of each connection's outbound event queue.
    pub outbound_queue_capacity: usize,
}
