//! InMemory 実装

pub mod membership;

pub use membership::InMemoryMembershipStore;
