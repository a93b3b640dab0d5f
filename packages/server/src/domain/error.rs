//! ドメインエラー
//!
//! Room とメッセージの全操作は `ChatRoomError` でエラーを返す。
//! 所有ノードに転送した呼び出しのエラーをそのまま返せるよう、シリアライズ可能にしている。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Room レジストリ、メッセージルーター、ミドルウェアチェーンのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum ChatRoomError {
    #[error("a room is required")]
    RoomRequired,

    #[error("both room and message are required")]
    RoomAndMessageRequired,

    #[error("room exists: {0}")]
    RoomExists(String),

    #[error("room does not exist: {0}")]
    RoomNotExist(String),

    #[error("connection {connection} not in this room ({room})")]
    NotInRoom { connection: String, room: String },

    #[error("connection {connection} already in this room ({room})")]
    AlreadyInRoom { connection: String, room: String },

    /// ミドルウェアによる拒否（理由の中身は解釈しない）
    #[error("{0}")]
    Middleware(String),

    #[error("middleware.name is required")]
    MiddlewareNameRequired,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl ChatRoomError {
    /// ミドルウェアの拒否を作成
    pub fn middleware(reason: impl Into<String>) -> Self {
        Self::Middleware(reason.into())
    }
}

/// 共有ストアのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupted member record for {key}: {reason}")]
    CorruptedRecord { key: String, reason: String },
}

/// メッセージバスのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum BusError {
    #[error("failed to publish: {0}")]
    PublishFailed(String),
}

/// クラスタ転送のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum DispatchError {
    #[error("no node owns connection {0}")]
    OwnerNotFound(String),

    #[error("unknown cluster method: {0}")]
    UnknownMethod(String),

    #[error("invalid arguments for {method}: {reason}")]
    InvalidArguments { method: String, reason: String },

    #[error("untrusted cluster call")]
    Untrusted,

    #[error("cluster transport error: {0}")]
    Transport(String),
}

/// このノードが保持する接続への送信エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("failed to push: {0}")]
    PushFailed(String),
}
