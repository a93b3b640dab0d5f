//! チャンネルを使った ConnectionHub 実装
//!
//! ## 責務
//!
//! - 接続ごとの `Connection`（Room 列、can_chat）と送信チャンネルを管理
//! - 配信時に `say` イベントへシリアライズして送信
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{
        Connection, ConnectionHub, ConnectionId, DeliveryError, MessagePayload, PusherChannel,
        RoomName,
    },
    infrastructure::dto::websocket::SayEvent,
};

struct HeldConnection {
    connection: Connection,
    channel: PusherChannel,
}

/// チャンネルを使った ConnectionHub 実装
#[derive(Default)]
pub struct ChannelConnectionHub {
    /// Key: 接続 ID
    connections: Mutex<HashMap<ConnectionId, HeldConnection>>,
}

impl ChannelConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionHub for ChannelConnectionHub {
    async fn register(&self, connection: Connection, channel: PusherChannel) -> bool {
        let mut connections = self.connections.lock().await;
        if connections.contains_key(&connection.id) {
            return false;
        }
        tracing::debug!("Connection '{}' registered", connection.id);
        connections.insert(
            connection.id.clone(),
            HeldConnection {
                connection,
                channel,
            },
        );
        true
    }

    async fn unregister(&self, id: &ConnectionId) -> Option<Connection> {
        let mut connections = self.connections.lock().await;
        let held = connections.remove(id)?;
        tracing::debug!("Connection '{}' unregistered", id);
        Some(held.connection)
    }

    async fn get(&self, id: &ConnectionId) -> Option<Connection> {
        let connections = self.connections.lock().await;
        connections.get(id).map(|held| held.connection.clone())
    }

    async fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.lock().await.contains_key(id)
    }

    async fn connections(&self) -> Vec<Connection> {
        let connections = self.connections.lock().await;
        connections
            .values()
            .map(|held| held.connection.clone())
            .collect()
    }

    async fn join_room(&self, id: &ConnectionId, room: &RoomName) -> bool {
        let mut connections = self.connections.lock().await;
        let Some(held) = connections.get_mut(id) else {
            return false;
        };
        let rooms = held.connection.rooms.get_or_insert_with(Vec::new);
        if rooms.contains(room) {
            return false;
        }
        rooms.push(room.clone());
        true
    }

    async fn leave_room(&self, id: &ConnectionId, room: &RoomName) -> bool {
        let mut connections = self.connections.lock().await;
        let Some(rooms) = connections
            .get_mut(id)
            .and_then(|held| held.connection.rooms.as_mut())
        else {
            return false;
        };
        let Some(index) = rooms.iter().position(|r| r == room) else {
            return false;
        };
        rooms.remove(index);
        true
    }

    async fn deliver(
        &self,
        id: &ConnectionId,
        payload: &MessagePayload,
    ) -> Result<(), DeliveryError> {
        let content = serde_json::to_string(&SayEvent::from(payload.clone()))
            .map_err(|e| DeliveryError::PushFailed(e.to_string()))?;

        let connections = self.connections.lock().await;
        let held = connections
            .get(id)
            .ok_or_else(|| DeliveryError::ConnectionNotFound(id.to_string()))?;
        held.channel
            .send(content)
            .map_err(|e| DeliveryError::PushFailed(e.to_string()))?;
        tracing::debug!("Delivered message in room '{}' to '{}'", payload.room, id);

        Ok(())
    }
}
