//! ConnectionHub trait 定義
//!
//! このノードが保持している接続の管理とメッセージ送信のインターフェース。
//! 接続の Room 列を変更できるのは、その接続を保持しているノードだけ。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{Connection, ConnectionId, DeliveryError, MessagePayload, RoomName};

/// メッセージ送信チャンネルの型エイリアス
///
/// UI 層（WebSocket）で生成された送信チャンネル。
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// ConnectionHub trait
#[async_trait]
pub trait ConnectionHub: Send + Sync {
    /// 接続を登録（同じ ID が既に存在する場合は `false`）
    async fn register(&self, connection: Connection, channel: PusherChannel) -> bool;

    /// 接続を登録解除し、最後の状態を返す
    async fn unregister(&self, id: &ConnectionId) -> Option<Connection>;

    /// 接続のスナップショットを取得
    async fn get(&self, id: &ConnectionId) -> Option<Connection>;

    /// 接続を保持しているか
    async fn contains(&self, id: &ConnectionId) -> bool;

    /// 保持している全接続のスナップショット
    async fn connections(&self) -> Vec<Connection>;

    /// 接続の Room 列に Room を追加
    async fn join_room(&self, id: &ConnectionId, room: &RoomName) -> bool;

    /// 接続の Room 列から Room を削除
    async fn leave_room(&self, id: &ConnectionId, room: &RoomName) -> bool;

    /// 接続にメッセージを届ける
    async fn deliver(&self, id: &ConnectionId, payload: &MessagePayload)
    -> Result<(), DeliveryError>;
}
