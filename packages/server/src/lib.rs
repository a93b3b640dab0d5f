//! 分散チャットルームのコア
//!
//! Room とメンバーは共有の Key-Value ストアに置き、チャットメッセージは pub/sub バスで
//! ノード間を流れ、各ノードが保持する接続に配信する。参加・退出・送信・配信の各ステップは
//! 優先度順のミドルウェアチェーンを通る。

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
pub mod engine;

pub use config::ChatRoomConfig;
pub use engine::Engine;
