//! Gateway surface: axum router, WebSocket/HTTP handlers, background tasks.

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::{GatewayConfig, GatewayServer};
