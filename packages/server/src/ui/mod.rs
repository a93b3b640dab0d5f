//! HTTP / WebSocket server for one chat room node.

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::{Server, router};
