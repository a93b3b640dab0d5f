//! Forwarded cluster call endpoint.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::{
    domain::{ChatRoomError, ClusterCall, ClusterNode, DispatchError},
    infrastructure::dto::cluster::{ClusterResponseDto, SERVER_TOKEN_HEADER},
    ui::state::AppState,
};

/// Execute a call forwarded by another node.
///
/// * `401` - the server token does not match
/// * `404` - this node does not hold the connection
/// * `200` - the owner's result (success or error) in `ClusterResponseDto`
pub async fn invoke_cluster_call(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(call): Json<ClusterCall>,
) -> Response {
    let trusted = headers
        .get(SERVER_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|token| token == state.engine.config().server_token);
    if !trusted {
        tracing::warn!(
            "Rejected untrusted cluster call {} for '{}'",
            call.method,
            call.connection_id
        );
        let result: Result<bool, ChatRoomError> = Err(DispatchError::Untrusted.into());
        return (StatusCode::UNAUTHORIZED, Json(ClusterResponseDto::from(result))).into_response();
    }

    match state.engine.handle_cluster_call(&call).await {
        Some(result) => Json(ClusterResponseDto::from(result)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
