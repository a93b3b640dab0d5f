//! このノードが保持する接続の管理
//!
//! ## 実装
//!
//! - `channel`: UI 層で生成された `UnboundedSender` を使う実装

pub mod channel;

pub use channel::ChannelConnectionHub;
