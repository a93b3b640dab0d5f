//! WebSocket connection handlers.
//!
//! Each socket is one `Connection` held by this node. The client sends JSON commands
//! (`join`, `leave`, `say`, `roomStatus`, `listRooms`) and receives one `response`
//! event per command plus `say` events for chat in its rooms.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{ChatRoomError, Connection, ConnectionId, PusherChannel, RoomName},
    engine::Engine,
    infrastructure::dto::{
        http::{RoomListDto, RoomStatusDto},
        websocket::{ClientCommand, ResponseEvent},
    },
    ui::state::AppState,
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// Generated when omitted
    pub client_id: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let connection_id = match query.client_id {
        Some(client_id) => match ConnectionId::new(client_id.as_str()) {
            Ok(id) => id,
            Err(_) => {
                tracing::warn!("Invalid client_id format: '{}'", client_id);
                return Err(StatusCode::BAD_REQUEST);
            }
        },
        None => ConnectionId::generate(),
    };

    // Create a channel for this client to receive messages
    let (tx, rx) = mpsc::unbounded_channel();
    let responder = tx.clone();

    if !state
        .engine
        .connect(Connection::new(connection_id.clone()), tx)
        .await
    {
        tracing::warn!(
            "Client with ID '{}' is already connected. Rejecting connection.",
            connection_id
        );
        return Err(StatusCode::CONFLICT);
    }

    let engine = state.engine.clone();
    let failed_id = connection_id.clone();
    Ok(ws
        .on_failed_upgrade(move |e| {
            tracing::warn!("WebSocket upgrade for '{}' failed: {}", failed_id, e);
            tokio::spawn(async move { engine.disconnect(&failed_id).await });
        })
        .on_upgrade(move |socket| handle_socket(socket, state, connection_id, responder, rx)))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

fn respond(responder: &PusherChannel, response: &ResponseEvent) {
    match serde_json::to_string(response) {
        Ok(json) => {
            if responder.send(json).is_err() {
                tracing::debug!("Response to '{}' dropped: socket closed", response.command);
            }
        }
        Err(e) => tracing::error!("Failed to serialize response: {}", e),
    }
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    connection_id: ConnectionId,
    responder: PusherChannel,
    rx: mpsc::UnboundedReceiver<String>,
) {
    let (sender, mut receiver) = socket.split();
    let mut send_task = pusher_loop(rx, sender);

    respond(
        &responder,
        &ResponseEvent::ok(
            "connect",
            Some(serde_json::json!({
                "connectionId": connection_id,
                "serverId": state.engine.server_id(),
            })),
        ),
    );

    let engine = state.engine.clone();
    let id = connection_id.clone();

    // Spawn a task to receive commands from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!("Received text from '{}': {}", id, text);

                    let command = match serde_json::from_str::<ClientCommand>(&text) {
                        Ok(command) => command,
                        Err(e) => {
                            tracing::warn!("Failed to parse command from '{}': {}", id, e);
                            respond(&responder, &ResponseEvent::error("unknown", e));
                            continue;
                        }
                    };

                    let name = command.name();
                    let response = match execute(&engine, &id, command).await {
                        Ok(data) => ResponseEvent::ok(name, data),
                        Err(e) => ResponseEvent::error(name, e),
                    };
                    respond(&responder, &response);
                }
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", id);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.engine.disconnect(&connection_id).await;
}

fn room_name(room: &str) -> Result<RoomName, ChatRoomError> {
    RoomName::new(room).map_err(|_| ChatRoomError::RoomRequired)
}

/// Run one client command on behalf of `connection_id`.
async fn execute(
    engine: &Engine,
    connection_id: &ConnectionId,
    command: ClientCommand,
) -> Result<Option<serde_json::Value>, ChatRoomError> {
    match command {
        ClientCommand::Join { room } => {
            let room = room_name(&room)?;
            engine.rooms().add_member(connection_id, &room).await?;
            Ok(None)
        }
        ClientCommand::Leave { room } => {
            let room = room_name(&room)?;
            engine.rooms().remove_member(connection_id, &room).await?;
            Ok(None)
        }
        ClientCommand::Say { room, message } => {
            engine.say(connection_id, &room, &message).await?;
            Ok(None)
        }
        ClientCommand::RoomStatus { room } => {
            let status = engine.rooms().room_status(&room).await?;
            Ok(serde_json::to_value(RoomStatusDto::from(status)).ok())
        }
        ClientCommand::ListRooms => {
            let rooms = engine.rooms().list().await?;
            Ok(serde_json::to_value(RoomListDto::from(rooms)).ok())
        }
    }
}
