//! Infrastructure 層
//!
//! ドメイン層の trait（MembershipStore, MessageBus, ClusterDispatcher, ConnectionHub）の実装と、
//! 外部とやり取りする DTO。

pub mod cluster;
pub mod connection_hub;
pub mod dto;
pub mod message_bus;
pub mod repository;
