//! WebSocket message DTOs.

use serde::{Deserialize, Serialize};

/// Type of an event pushed to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventType {
    /// Chat message delivered to a room member
    Say,
    /// Answer to a client command
    Response,
}

/// Chat message delivered to a connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SayEvent {
    pub r#type: EventType,
    pub message: String,
    pub room: String,
    pub from: String,
    pub context: String,
    pub sent_at: i64,
}

/// Command sent by a client
///
/// ```json
/// {"type":"join","room":"lobby"}
/// {"type":"say","room":"lobby","message":"hello"}
/// {"type":"listRooms"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientCommand {
    Join {
        #[serde(default)]
        room: String,
    },
    Leave {
        #[serde(default)]
        room: String,
    },
    Say {
        #[serde(default)]
        room: String,
        #[serde(default)]
        message: String,
    },
    RoomStatus {
        #[serde(default)]
        room: String,
    },
    ListRooms,
}

impl ClientCommand {
    /// Command name echoed back in the response
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Leave { .. } => "leave",
            Self::Say { .. } => "say",
            Self::RoomStatus { .. } => "roomStatus",
            Self::ListRooms => "listRooms",
        }
    }
}

/// Answer to a client command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEvent {
    pub r#type: EventType,
    pub command: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEvent {
    pub fn ok(command: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self {
            r#type: EventType::Response,
            command: command.into(),
            ok: true,
            data,
            error: None,
        }
    }

    pub fn error(command: impl Into<String>, error: impl ToString) -> Self {
        Self {
            r#type: EventType::Response,
            command: command.into(),
            ok: false,
            data: None,
            error: Some(error.to_string()),
        }
    }
}
