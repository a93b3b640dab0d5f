//! Entities
//!
//! Room のメンバー情報、接続、チャットメッセージ（ペイロードとクラスタ上のエンベロープ）。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::value_object::{ConnectionId, NodeId, RoomName};

/// 接続から送信されたメッセージの `MessagePayload::context`
pub const USER_CONTEXT: &str = "user";

/// この種別のエンベロープだけを接続に配信する
pub const CHAT_MESSAGE_TYPE: &str = "chat";

/// Room の削除直前にメンバーへ届ける通知の本文
pub const ROOM_DELETED_NOTICE: &str = "this room has been deleted";

/// Room メンバー（共有ストア上のレコード）
///
/// `host` は接続を受け付けたノードの ID で、外部に返すときは取り除く。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: ConnectionId,
    pub joined_at: i64,
    pub host: NodeId,
}

impl Member {
    pub fn new(id: ConnectionId, joined_at: i64, host: NodeId) -> Self {
        Self {
            id,
            joined_at,
            host,
        }
    }

    /// 内部用の host を取り除く
    pub fn sanitize(&self) -> MemberDetails {
        MemberDetails {
            id: self.id.clone(),
            joined_at: self.joined_at,
        }
    }
}

/// 外部に公開するメンバー情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDetails {
    pub id: ConnectionId,
    pub joined_at: i64,
}

/// Room の状態
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStatus {
    pub room: RoomName,
    pub members: BTreeMap<ConnectionId, MemberDetails>,
    pub members_count: usize,
}

/// 接続
///
/// 接続を受け付けたノードだけが `rooms` を変更する。共有ストアのメンバーレコードは
/// その写しである。`rooms` が `None` の接続（システム送信）は Room 所属チェックを受けない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub rooms: Option<Vec<RoomName>>,
    pub can_chat: bool,
}

impl Connection {
    /// Room に未所属で、チャットを受信できる接続を作成
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            rooms: Some(Vec::new()),
            can_chat: true,
        }
    }

    /// システム送信用の接続。Room 列を持たないため、どの Room にも送信できる
    pub fn system() -> Self {
        Self {
            id: ConnectionId::system(),
            rooms: None,
            can_chat: false,
        }
    }

    pub fn is_in_room(&self, room: &RoomName) -> bool {
        self.rooms
            .as_ref()
            .is_some_and(|rooms| rooms.contains(room))
    }

    /// `room` に送信できるか（Room 列を持たないか、Room 列に `room` を含む）
    pub fn may_send_to(&self, room: &RoomName) -> bool {
        self.rooms.as_ref().is_none_or(|rooms| rooms.contains(room))
    }
}

/// チャットメッセージのペイロード（ノード内部で扱う正規形）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub message: String,
    pub room: RoomName,
    pub from: ConnectionId,
    pub context: String,
    pub sent_at: i64,
}

/// エンベロープ内の送信元情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeConnection {
    pub id: ConnectionId,
    pub room: RoomName,
}

/// クラスタのメッセージバスに流すエンベロープ
///
/// `server_token` は信頼できるクラスタメンバーかどうかの判定に使う。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEnvelope {
    pub message_type: String,
    pub server_token: String,
    pub server_id: NodeId,
    pub message: String,
    pub sent_at: i64,
    pub connection: EnvelopeConnection,
}

impl ChatEnvelope {
    /// `server_id` から publish するエンベロープに包む
    pub fn from_payload(payload: &MessagePayload, server_id: NodeId, server_token: String) -> Self {
        Self {
            message_type: CHAT_MESSAGE_TYPE.to_string(),
            server_token,
            server_id,
            message: payload.message.clone(),
            sent_at: payload.sent_at,
            connection: EnvelopeConnection {
                id: payload.from.clone(),
                room: payload.room.clone(),
            },
        }
    }

    /// 正規形のペイロードを取り出す（context は常に user）
    pub fn to_payload(&self) -> MessagePayload {
        MessagePayload {
            message: self.message.clone(),
            room: self.connection.room.clone(),
            from: self.connection.id.clone(),
            context: USER_CONTEXT.to_string(),
            sent_at: self.sent_at,
        }
    }
}
