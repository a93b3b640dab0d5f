//! HTTP API request / response DTOs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// `GET /api/rooms`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListDto {
    pub rooms: Vec<String>,
}

/// `POST /api/rooms`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateRoomRequest {
    #[serde(default)]
    pub room: String,
}

/// `GET /api/rooms/{room}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStatusDto {
    pub room: String,
    pub members: BTreeMap<String, MemberDetailDto>,
    pub members_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDetailDto {
    pub id: String,
    /// Unix epoch milliseconds
    pub joined_at: i64,
    /// `joined_at` rendered as RFC 3339
    pub joined_at_rfc3339: String,
}

/// `POST /api/rooms/{room}/members`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    #[serde(default)]
    pub connection_id: String,
}

/// `POST /api/rooms/{room}/messages`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BroadcastRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OkDto {
    pub ok: bool,
}

/// Error body of every failed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDto {
    pub error: String,
}
