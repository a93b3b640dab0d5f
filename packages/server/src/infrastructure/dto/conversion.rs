//! Conversion logic between DTOs and domain entities.

use hiroba_shared::time::timestamp_to_rfc3339;

use crate::domain::{ChatRoomError, MessagePayload, RoomName, RoomStatus};
use crate::infrastructure::dto::{cluster, http, websocket};

// ========================================
// Domain Entity → DTO
// ========================================

impl From<MessagePayload> for websocket::SayEvent {
    fn from(model: MessagePayload) -> Self {
        Self {
            r#type: websocket::EventType::Say,
            message: model.message,
            room: model.room.into_string(),
            from: model.from.into_string(),
            context: model.context,
            sent_at: model.sent_at,
        }
    }
}

impl From<RoomStatus> for http::RoomStatusDto {
    fn from(model: RoomStatus) -> Self {
        let members = model
            .members
            .into_iter()
            .map(|(id, details)| {
                (
                    id.into_string(),
                    http::MemberDetailDto {
                        id: details.id.into_string(),
                        joined_at: details.joined_at,
                        joined_at_rfc3339: timestamp_to_rfc3339(details.joined_at),
                    },
                )
            })
            .collect();

        Self {
            room: model.room.into_string(),
            members,
            members_count: model.members_count,
        }
    }
}

impl From<Vec<RoomName>> for http::RoomListDto {
    fn from(rooms: Vec<RoomName>) -> Self {
        Self {
            rooms: rooms.into_iter().map(RoomName::into_string).collect(),
        }
    }
}

impl From<Result<bool, ChatRoomError>> for cluster::ClusterResponseDto {
    fn from(result: Result<bool, ChatRoomError>) -> Self {
        match result {
            Ok(ok) => Self {
                ok: Some(ok),
                error: None,
            },
            Err(error) => Self {
                ok: None,
                error: Some(error),
            },
        }
    }
}
