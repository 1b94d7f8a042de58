//! Outbound delivery implementations of the `MessagePusher` seam.

mod websocket;

pub use websocket::WebSocketMessagePusher;
