//! クラスタ内の呼び出し転送
//!
//! 接続の Room 列を変更する操作は、その接続を保持しているノードで実行する必要がある。
//! 接続を保持していない場合は、呼び出し（メソッド名と引数）をそのまま
//! `ClusterDispatcher` で転送し、所有ノードの結果を返す。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ChatRoomError, ConnectionId, DispatchError, MessagePayload, RoomName};

/// 転送された `addMember` のメソッド名
pub const ADD_MEMBER_METHOD: &str = "api.chatRoom.addMember";

/// 転送された `removeMember` のメソッド名
pub const REMOVE_MEMBER_METHOD: &str = "api.chatRoom.removeMember";

/// Room 削除に伴うメンバー削除のメソッド名
///
/// 引数は `[connectionId, room]`。削除通知を届ける場合は
/// `[connectionId, room, message, from, context, sentAt]`。
pub const DISMISS_MEMBER_METHOD: &str = "api.chatRoom.dismissMember";

/// 転送される Room 操作
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCall {
    pub method: String,
    pub args: Vec<String>,
    /// この接続を保持しているノードが実行する
    pub connection_id: ConnectionId,
}

/// 他ノードの代わりに実行できる操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterOperation {
    AddMember {
        connection_id: ConnectionId,
        room: RoomName,
    },
    RemoveMember {
        connection_id: ConnectionId,
        room: RoomName,
    },
    /// 所属チェックなしの削除。`notice` があれば削除前に届ける
    DismissMember {
        connection_id: ConnectionId,
        room: RoomName,
        notice: Option<MessagePayload>,
    },
}

impl ClusterCall {
    pub fn add_member(connection_id: &ConnectionId, room: &RoomName) -> Self {
        Self::membership(ADD_MEMBER_METHOD, connection_id, room)
    }

    pub fn remove_member(connection_id: &ConnectionId, room: &RoomName) -> Self {
        Self::membership(REMOVE_MEMBER_METHOD, connection_id, room)
    }

    pub fn dismiss_member(
        connection_id: &ConnectionId,
        room: &RoomName,
        notice: Option<&MessagePayload>,
    ) -> Self {
        let mut call = Self::membership(DISMISS_MEMBER_METHOD, connection_id, room);
        if let Some(notice) = notice {
            call.args.extend([
                notice.message.clone(),
                notice.from.to_string(),
                notice.context.clone(),
                notice.sent_at.to_string(),
            ]);
        }
        call
    }

    fn membership(method: &str, connection_id: &ConnectionId, room: &RoomName) -> Self {
        Self {
            method: method.to_string(),
            args: vec![connection_id.to_string(), room.to_string()],
            connection_id: connection_id.clone(),
        }
    }

    /// メソッド名と引数を解釈する
    pub fn operation(&self) -> Result<ClusterOperation, DispatchError> {
        let invalid = |reason: &str| DispatchError::InvalidArguments {
            method: self.method.clone(),
            reason: reason.to_string(),
        };

        let (connection_id, room, rest) = match self.args.as_slice() {
            [connection_id, room, rest @ ..] => (
                ConnectionId::new(connection_id.as_str())
                    .map_err(|e| invalid(&e.to_string()))?,
                RoomName::new(room.as_str()).map_err(|e| invalid(&e.to_string()))?,
                rest,
            ),
            _ => return Err(invalid("expected [connectionId, room]")),
        };

        match (self.method.as_str(), rest) {
            (ADD_MEMBER_METHOD, []) => Ok(ClusterOperation::AddMember {
                connection_id,
                room,
            }),
            (REMOVE_MEMBER_METHOD, []) => Ok(ClusterOperation::RemoveMember {
                connection_id,
                room,
            }),
            (DISMISS_MEMBER_METHOD, []) => Ok(ClusterOperation::DismissMember {
                connection_id,
                room,
                notice: None,
            }),
            (DISMISS_MEMBER_METHOD, [message, from, context, sent_at]) => {
                let notice = MessagePayload {
                    message: message.clone(),
                    room: room.clone(),
                    from: ConnectionId::new(from.as_str()).map_err(|e| invalid(&e.to_string()))?,
                    context: context.clone(),
                    sent_at: sent_at.parse().map_err(|_| invalid("sentAt must be an integer"))?,
                };
                Ok(ClusterOperation::DismissMember {
                    connection_id,
                    room,
                    notice: Some(notice),
                })
            }
            (ADD_MEMBER_METHOD | REMOVE_MEMBER_METHOD | DISMISS_MEMBER_METHOD, _) => {
                Err(invalid("unexpected number of arguments"))
            }
            (other, _) => Err(DispatchError::UnknownMethod(other.to_string())),
        }
    }
}

/// `call.connection_id` を保持しているノードに呼び出しを届ける
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClusterDispatcher: Send + Sync {
    async fn invoke(&self, call: ClusterCall) -> Result<bool, ChatRoomError>;
}

/// 転送された呼び出しの受け手
#[async_trait]
pub trait ClusterNode: Send + Sync {
    /// 接続を保持していない場合は `None`
    async fn handle_cluster_call(&self, call: &ClusterCall) -> Option<Result<bool, ChatRoomError>>;
}
