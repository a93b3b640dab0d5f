//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::{ChatRoomError, ConnectionId, RoomName},
    infrastructure::dto::http::{
        AddMemberRequest, BroadcastRequest, CreateRoomRequest, OkDto, RoomListDto, RoomStatusDto,
    },
    ui::state::AppState,
};

use super::error::ApiError;

fn room_name(room: &str) -> Result<RoomName, ApiError> {
    RoomName::new(room).map_err(|_| ChatRoomError::RoomRequired.into())
}

fn connection_id(id: &str) -> Result<ConnectionId, ApiError> {
    ConnectionId::new(id).map_err(|_| ApiError::BadRequest("connectionId is required".to_string()))
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Result<Json<RoomListDto>, ApiError> {
    let rooms = state.engine.rooms().list().await?;
    Ok(Json(rooms.into()))
}

/// Create a room
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<OkDto>), ApiError> {
    let room = room_name(&request.room)?;
    state.engine.rooms().add(&room).await?;
    Ok((StatusCode::CREATED, Json(OkDto { ok: true })))
}

/// Get room status (members without their host)
pub async fn get_room_status(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
) -> Result<Json<RoomStatusDto>, ApiError> {
    let status = state.engine.rooms().room_status(&room).await?;
    // Domain Model から DTO への変換
    Ok(Json(status.into()))
}

/// Destroy a room
pub async fn destroy_room(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
) -> Result<StatusCode, ApiError> {
    let room = room_name(&room)?;
    state.engine.rooms().destroy(&room).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a connection (held by any node of the cluster) to a room
pub async fn add_member(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
    Json(request): Json<AddMemberRequest>,
) -> Result<Json<OkDto>, ApiError> {
    let room = room_name(&room)?;
    let id = connection_id(&request.connection_id)?;
    let ok = state.engine.rooms().add_member(&id, &room).await?;
    Ok(Json(OkDto { ok }))
}

/// Remove a connection (held by any node of the cluster) from a room
pub async fn remove_member(
    State(state): State<Arc<AppState>>,
    Path((room, id)): Path<(String, String)>,
) -> Result<Json<OkDto>, ApiError> {
    let room = room_name(&room)?;
    let id = connection_id(&id)?;
    let ok = state.engine.rooms().remove_member(&id, &room).await?;
    Ok(Json(OkDto { ok }))
}

/// Broadcast a message to a room as the server
pub async fn broadcast_message(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
    Json(request): Json<BroadcastRequest>,
) -> Result<(StatusCode, Json<OkDto>), ApiError> {
    state.engine.announce(&room, &request.message).await?;
    Ok((StatusCode::ACCEPTED, Json(OkDto { ok: true })))
}
