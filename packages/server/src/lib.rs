//! Room-based realtime support-chat gateway.
//!
//! This library implements the connection, room-membership, presence and
//! message fan-out core of a support-chat service: clients connect over
//! WebSocket, join conversation rooms, and exchange messages and typing
//! indicators which the gateway broadcasts to room members. Durable storage,
//! credential verification and offline notification are external
//! collaborators reached through trait seams.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
