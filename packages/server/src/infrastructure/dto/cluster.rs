//! Cluster call DTOs.
//!
//! The request body of `POST /internal/cluster/invoke` is the domain `ClusterCall`
//! itself; only the answer needs a wire shape.

use serde::{Deserialize, Serialize};

use crate::domain::{ChatRoomError, DispatchError};

/// Shared-secret header carried by every forwarded call
pub const SERVER_TOKEN_HEADER: &str = "x-hiroba-server-token";

/// Path of the forwarded call endpoint
pub const CLUSTER_INVOKE_PATH: &str = "/internal/cluster/invoke";

/// Owner's answer to a forwarded call: exactly one of `ok` / `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterResponseDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ChatRoomError>,
}

impl ClusterResponseDto {
    pub fn into_result(self) -> Result<bool, ChatRoomError> {
        match (self.ok, self.error) {
            (_, Some(error)) => Err(error),
            (Some(ok), None) => Ok(ok),
            (None, None) => Err(DispatchError::Transport("empty cluster response".to_string()).into()),
        }
    }
}
