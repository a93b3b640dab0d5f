//! Cluster message bus implementations.
//!
//! - `local`: tokio broadcast channel shared by every engine of one process

pub mod local;

pub use local::LocalMessageBus;
