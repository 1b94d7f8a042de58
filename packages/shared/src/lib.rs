//! Cross-cutting utilities shared by the gateway binary and its tests.

pub mod logger;
pub mod time;
