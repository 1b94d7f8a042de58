//! Infrastructure layer: in-memory runtime state, collaborator
//! implementations, and wire DTOs.

pub mod auth;
pub mod dto;
pub mod message_pusher;
pub mod notify;
pub mod presence;
pub mod registry;
pub mod rooms;
pub mod store;
