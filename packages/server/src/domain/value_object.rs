//! Value Objects
//!
//! 文字列の識別子をそのまま扱わず、空文字を型レベルで排除するための値オブジェクト。

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 値オブジェクト生成時のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

macro_rules! string_value_object {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
                let value = value.into();
                if value.is_empty() {
                    return Err(ValueObjectError::Empty($label));
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueObjectError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ValueObjectError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_value_object!(
    /// Room 名（クラスタ全体で一意）
    RoomName,
    "room"
);

string_value_object!(
    /// 接続 ID（接続を受け付けたノードが所有する）
    ConnectionId,
    "connection id"
);

string_value_object!(
    /// ノード（サーバインスタンス）ID
    NodeId,
    "node id"
);

impl NodeId {
    /// ランダムなノード ID を生成
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// システム送信に使う接続 ID
pub const SYSTEM_CONNECTION_ID: &str = "0";

impl ConnectionId {
    /// システム送信用の接続 ID
    pub fn system() -> Self {
        Self(SYSTEM_CONNECTION_ID.to_string())
    }

    /// ランダムな接続 ID を生成
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_name_rejects_empty() {
        // テスト項目: 空文字の Room 名は生成できない
        // given (前提条件):
        let value = "";

        // when (操作):
        let result = RoomName::new(value);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::Empty("room")));
    }

    #[test]
    fn test_connection_id_roundtrips_through_serde_as_plain_string() {
        // テスト項目: 接続 ID は JSON 上ではただの文字列として表現される
        // given (前提条件):
        let id = ConnectionId::new("c1").unwrap();

        // when (操作):
        let json = serde_json::to_string(&id).unwrap();
        let empty: Result<ConnectionId, _> = serde_json::from_str("\"\"");

        // then (期待する結果):
        assert_eq!(json, "\"c1\"");
        assert!(empty.is_err());
    }

    #[test]
    fn test_generated_node_ids_are_unique() {
        // テスト項目: 生成されたノード ID は毎回異なる
        // when (操作):
        let a = NodeId::generate();
        let b = NodeId::generate();

        // then (期待する結果):
        assert_ne!(a, b);
    }
}
