//! UseCase: ミドルウェアチェーンの実行
//!
//! ## 概要
//!
//! 1 方向分のハンドラを `MiddlewareRegistry` の実行順で**逐次**実行する。
//! 最初のエラーでチェーンを打ち切り、残りのハンドラは実行しない。
//!
//! - ペイロードあり（`onSayReceive` / `say`）: 各ハンドラは実行中ペイロードの複製を受け取り、
//!   `Some` を返すと次のハンドラ以降のペイロードが置き換わる
//! - ペイロードなし（`join` / `leave`）: 成功 / 失敗のみ
//!
//! ハンドラ一覧はレジストリの読み取りロック中にスナップショットを取り、
//! ハンドラ実行中はロックを保持しない。

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::{
    ChatRoomError, Connection, MessagePayload, MiddlewareDirection, MiddlewareHandler,
    MiddlewareRegistry, RoomName,
};

/// ミドルウェアチェーンの実行器
#[derive(Clone)]
pub struct MiddlewareChainExecutor {
    registry: Arc<RwLock<MiddlewareRegistry>>,
}

impl MiddlewareChainExecutor {
    pub fn new(registry: Arc<RwLock<MiddlewareRegistry>>) -> Self {
        Self { registry }
    }

    async fn handlers(&self, direction: MiddlewareDirection) -> Vec<(String, MiddlewareHandler)> {
        self.registry.read().await.handlers(direction)
    }

    /// ペイロードを伴う方向のチェーンを実行
    ///
    /// # Returns
    ///
    /// * `Ok(MessagePayload)` - 最後に置き換えられたペイロード（置き換えがなければ元のペイロード）
    /// * `Err(ChatRoomError)` - いずれかのハンドラが拒否した
    pub async fn run_with_payload(
        &self,
        connection: &Connection,
        room: &RoomName,
        direction: MiddlewareDirection,
        payload: MessagePayload,
    ) -> Result<MessagePayload, ChatRoomError> {
        let mut current = payload;

        for (name, handler) in self.handlers(direction).await {
            let MiddlewareHandler::Payload(handler) = handler else {
                continue;
            };

            match handler(connection.clone(), room.clone(), current.clone()).await {
                Ok(Some(replacement)) => current = replacement,
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(
                        "Middleware '{}' rejected {} for '{}' in room '{}': {}",
                        name,
                        direction,
                        connection.id,
                        room,
                        e
                    );
                    return Err(e);
                }
            }
        }

        Ok(current)
    }

    /// ペイロードを伴わない方向（join / leave）のチェーンを実行
    pub async fn run(
        &self,
        connection: &Connection,
        room: &RoomName,
        direction: MiddlewareDirection,
    ) -> Result<(), ChatRoomError> {
        for (name, handler) in self.handlers(direction).await {
            let MiddlewareHandler::Membership(handler) = handler else {
                continue;
            };

            if let Err(e) = handler(connection.clone(), room.clone()).await {
                tracing::debug!(
                    "Middleware '{}' rejected {} for '{}' in room '{}': {}",
                    name,
                    direction,
                    connection.id,
                    room,
                    e
                );
                return Err(e);
            }
        }

        Ok(())
    }
}
