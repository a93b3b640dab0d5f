//! Data Transfer Objects (DTOs) for the chat room server.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket commands and events
//! - `http`: HTTP API request / response DTOs
//! - `cluster`: forwarded cluster call responses

pub mod cluster;
pub mod conversion;
pub mod http;
pub mod websocket;
