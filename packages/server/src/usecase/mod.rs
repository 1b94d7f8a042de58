//! UseCase layer: one use case per gateway operation.
//!
//! Use cases orchestrate the runtime components (registry, room directory,
//! presence tracker) and the external collaborator seams; they own the
//! decision of what gets broadcast and to whom.

mod connect_session;
mod disconnect_session;
mod error;
mod join_room;
mod leave_room;
mod send_message;
mod typing;

pub use connect_session::ConnectSessionUseCase;
pub use disconnect_session::DisconnectSessionUseCase;
pub use error::{ConnectError, JoinRoomError, LeaveRoomError, SendMessageError, TypingError};
pub use join_room::JoinRoomUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use send_message::SendMessageUseCase;
pub use typing::TypingUseCase;
