//! Mapping of domain errors to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    domain::{ChatRoomError, DispatchError},
    infrastructure::dto::http::ErrorDto,
};

/// Error returned by the HTTP API handlers
#[derive(Debug)]
pub enum ApiError {
    Domain(ChatRoomError),
    /// Malformed request outside the domain's own validation
    BadRequest(String),
}

impl From<ChatRoomError> for ApiError {
    fn from(error: ChatRoomError) -> Self {
        Self::Domain(error)
    }
}

/// HTTP status for a domain error
pub fn status_code(error: &ChatRoomError) -> StatusCode {
    match error {
        ChatRoomError::RoomRequired
        | ChatRoomError::RoomAndMessageRequired
        | ChatRoomError::MiddlewareNameRequired => StatusCode::BAD_REQUEST,
        ChatRoomError::RoomNotExist(_) => StatusCode::NOT_FOUND,
        ChatRoomError::RoomExists(_)
        | ChatRoomError::AlreadyInRoom { .. }
        | ChatRoomError::NotInRoom { .. } => StatusCode::CONFLICT,
        ChatRoomError::Middleware(_) => StatusCode::FORBIDDEN,
        ChatRoomError::Dispatch(DispatchError::OwnerNotFound(_)) => StatusCode::NOT_FOUND,
        ChatRoomError::Store(_) | ChatRoomError::Bus(_) | ChatRoomError::Dispatch(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Domain(error) => {
                let status = status_code(&error);
                if status.is_server_error() {
                    tracing::error!("Request failed: {}", error);
                } else {
                    tracing::debug!("Request rejected: {}", error);
                }
                (status, error.to_string())
            }
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
        };

        (status, Json(ErrorDto { error: message })).into_response()
    }
}
