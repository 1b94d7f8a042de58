//! Wire DTOs for the HTTP and WebSocket surfaces.
//!
//! DTOs carry raw wire strings; conversion to validated domain types happens
//! at the edge (handlers and use cases), never inside the DTOs themselves.

pub mod http;
pub mod websocket;
