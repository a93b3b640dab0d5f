//! チャットルームの設定

use crate::domain::{NodeId, RoomName};

/// トークン未設定時の値。クラスタの全ノードで同じトークンを使う必要がある
pub const DEFAULT_SERVER_TOKEN: &str = "change-me";

/// 優先度なしで登録されたミドルウェアの優先度
pub const DEFAULT_MIDDLEWARE_PRIORITY: i64 = 100;

/// 共有ストアのキー配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreKeys {
    /// Room 名の集合
    pub rooms: String,
    /// Room ごとのメンバーハッシュのキー接頭辞
    pub members_prefix: String,
}

impl StoreKeys {
    pub fn members_key(&self, room: &RoomName) -> String {
        format!("{}{}", self.members_prefix, room)
    }
}

impl Default for StoreKeys {
    fn default() -> Self {
        Self {
            rooms: "hiroba:chatRoom:rooms".to_string(),
            members_prefix: "hiroba:chatRoom:members:".to_string(),
        }
    }
}

/// ノードごとの設定
#[derive(Debug, Clone)]
pub struct ChatRoomConfig {
    /// このノードの ID（メンバーレコードの host になる）
    pub server_id: NodeId,
    /// 信頼できるクラスタメンバーを判定する共有シークレット
    pub server_token: String,
    pub default_middleware_priority: i64,
    /// エンジン開始時に作成する Room
    pub starting_rooms: Vec<RoomName>,
    pub keys: StoreKeys,
}

impl Default for ChatRoomConfig {
    fn default() -> Self {
        Self {
            server_id: NodeId::generate(),
            server_token: DEFAULT_SERVER_TOKEN.to_string(),
            default_middleware_priority: DEFAULT_MIDDLEWARE_PRIORITY,
            starting_rooms: Vec::new(),
            keys: StoreKeys::default(),
        }
    }
}

impl ChatRoomConfig {
    pub fn with_server_id(mut self, server_id: NodeId) -> Self {
        self.server_id = server_id;
        self
    }

    pub fn with_server_token(mut self, server_token: impl Into<String>) -> Self {
        self.server_token = server_token.into();
        self
    }

    pub fn with_starting_rooms(mut self, rooms: Vec<RoomName>) -> Self {
        self.starting_rooms = rooms;
        self
    }

    pub fn with_default_middleware_priority(mut self, priority: i64) -> Self {
        self.default_middleware_priority = priority;
        self
    }
}
