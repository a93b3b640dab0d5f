//! Repository 実装
//!
//! - `inmemory`: 共有 KV ストアと同じレイアウトをメモリ上に持つ実装

pub mod inmemory;

pub use inmemory::InMemoryMembershipStore;
