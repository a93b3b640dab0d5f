//! UseCase 層
//!
//! - `middleware_chain`: ミドルウェアチェーンの逐次実行
//! - `message_router`: メッセージの送信（バスへの publish）と受信側の配信
//! - `room_registry`: Room のライフサイクルとメンバー管理（所有ノードへの転送を含む）

pub mod message_router;
pub mod middleware_chain;
pub mod room_registry;

pub use message_router::MessageRouter;
pub use middleware_chain::MiddlewareChainExecutor;
pub use room_registry::RoomRegistry;
