//! HTTP / WebSocket handlers.

mod cluster;
mod error;
mod http;
mod websocket;

pub use cluster::invoke_cluster_call;
pub use http::{
    add_member, broadcast_message, create_room, destroy_room, get_room_status, get_rooms,
    health_check, remove_member,
};
pub use websocket::websocket_handler;
