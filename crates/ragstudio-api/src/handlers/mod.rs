//! HTTP and WebSocket handlers, one module per route group.

pub mod documents;
pub mod graph;
pub mod query;
pub mod system;
pub mod vectors;
pub mod websocket;
