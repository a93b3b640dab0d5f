//! UseCase: チャットメッセージの送信と配信
//!
//! ## 概要
//!
//! - `broadcast`: 入力を検証し、`onSayReceive` チェーンを通したペイロードをクラスタの
//!   メッセージバスに publish する（組み立てだけなら `compose`）
//! - `on_incoming`: バスの購読側。このノードが保持する全接続に配信を試みる
//! - `deliver_to`: 接続ごとの配信。`say` チェーンで拒否された場合は黙って破棄する
//!   （送信者にはすでに `broadcast` の結果が返っている）

use std::sync::Arc;

use futures_util::future::join_all;
use hiroba_shared::time::Clock;

use crate::domain::{
    CHAT_MESSAGE_TYPE, ChatEnvelope, ChatRoomError, Connection, ConnectionHub, EnvelopeConnection,
    MessageBus, MessagePayload, MiddlewareDirection, NodeId, RoomName,
};

use super::middleware_chain::MiddlewareChainExecutor;

/// メッセージの送信・配信のユースケース
pub struct MessageRouter {
    /// このノードが保持する接続
    hub: Arc<dyn ConnectionHub>,
    /// クラスタのメッセージバス
    bus: Arc<dyn MessageBus>,
    middleware: MiddlewareChainExecutor,
    clock: Arc<dyn Clock>,
    server_id: NodeId,
    server_token: String,
}

impl MessageRouter {
    pub fn new(
        hub: Arc<dyn ConnectionHub>,
        bus: Arc<dyn MessageBus>,
        middleware: MiddlewareChainExecutor,
        clock: Arc<dyn Clock>,
        server_id: NodeId,
        server_token: String,
    ) -> Self {
        Self {
            hub,
            bus,
            middleware,
            clock,
            server_id,
            server_token,
        }
    }

    fn envelope(&self, payload: &MessagePayload) -> ChatEnvelope {
        ChatEnvelope::from_payload(payload, self.server_id.clone(), self.server_token.clone())
    }

    /// メッセージを Room にブロードキャスト
    ///
    /// # Arguments
    ///
    /// * `connection` - 送信元の接続（`rooms` が `None` なら所属チェックを行わない）
    /// * `room` - 送信先の Room 名
    /// * `message` - メッセージ本文
    ///
    /// # Returns
    ///
    /// * `Ok(())` - publish 成功
    /// * `Err(ChatRoomError)` - 入力不備、未所属、ミドルウェアの拒否、バスのエラー
    pub async fn broadcast(
        &self,
        connection: &Connection,
        room: &str,
        message: &str,
    ) -> Result<(), ChatRoomError> {
        let payload = self.compose(connection, room, message).await?;

        self.bus.publish(self.envelope(&payload)).await?;
        tracing::debug!(
            "Published message from '{}' to room '{}'",
            payload.from,
            payload.room
        );

        Ok(())
    }

    /// 送信するペイロードを組み立てる（publish はしない）
    ///
    /// 入力検証と所属チェックの後、`onSayReceive` チェーンを通す。
    pub async fn compose(
        &self,
        connection: &Connection,
        room: &str,
        message: &str,
    ) -> Result<MessagePayload, ChatRoomError> {
        if room.is_empty() || message.is_empty() {
            return Err(ChatRoomError::RoomAndMessageRequired);
        }
        let room = RoomName::new(room).map_err(|_| ChatRoomError::RoomAndMessageRequired)?;

        if !connection.may_send_to(&room) {
            return Err(ChatRoomError::NotInRoom {
                connection: connection.id.to_string(),
                room: room.into_string(),
            });
        }

        let envelope = ChatEnvelope {
            message_type: CHAT_MESSAGE_TYPE.to_string(),
            server_token: self.server_token.clone(),
            server_id: self.server_id.clone(),
            message: message.to_string(),
            sent_at: self.clock.now_millis(),
            connection: EnvelopeConnection {
                id: connection.id.clone(),
                room: room.clone(),
            },
        };

        self.middleware
            .run_with_payload(
                connection,
                &room,
                MiddlewareDirection::OnSayReceive,
                envelope.to_payload(),
            )
            .await
    }

    /// バスから受信したエンベロープを、このノードの接続に配信
    pub async fn on_incoming(&self, envelope: ChatEnvelope) {
        if envelope.server_token != self.server_token {
            tracing::warn!(
                "Dropping chat envelope from untrusted server '{}'",
                envelope.server_id
            );
            return;
        }
        if envelope.message_type != CHAT_MESSAGE_TYPE {
            tracing::debug!("Ignoring envelope of type '{}'", envelope.message_type);
            return;
        }

        let payload = envelope.to_payload();
        let connections = self.hub.connections().await;
        join_all(
            connections
                .iter()
                .map(|connection| self.deliver_to(connection, &payload)),
        )
        .await;
    }

    /// 1 接続への配信
    ///
    /// # Returns
    ///
    /// 接続に渡した場合 `true`
    pub async fn deliver_to(&self, connection: &Connection, payload: &MessagePayload) -> bool {
        if !connection.can_chat || !connection.is_in_room(&payload.room) {
            return false;
        }

        let payload = match self
            .middleware
            .run_with_payload(
                connection,
                &payload.room,
                MiddlewareDirection::Say,
                payload.clone(),
            )
            .await
        {
            Ok(payload) => payload,
            Err(e) => {
                tracing::debug!(
                    "Dropped message in room '{}' for '{}': {}",
                    payload.room,
                    connection.id,
                    e
                );
                return false;
            }
        };

        match self.hub.deliver(&connection.id, &payload).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to deliver message to '{}': {}", connection.id, e);
                false
            }
        }
    }
}
