//! HTTP で他ノードに転送する ClusterDispatcher 実装
//!
//! 呼び出しを設定済みの全ピアの `POST /internal/cluster/invoke` に順に送り、
//! 最初に接続を所有していると答えたノードの結果（成功 / エラー）をそのまま返す。
//!
//! - `404 Not Found`: そのピアは接続を所有していない
//! - `401 Unauthorized`: サーバートークンが一致しない
//!
//! 通信エラーは記録しておき、どのピアも所有していなかった場合に返す。

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::{
    domain::{ChatRoomError, ClusterCall, ClusterDispatcher, DispatchError},
    infrastructure::dto::cluster::{CLUSTER_INVOKE_PATH, ClusterResponseDto, SERVER_TOKEN_HEADER},
};

/// HTTP で他ノードに転送する ClusterDispatcher
pub struct HttpClusterDispatcher {
    client: reqwest::Client,
    /// ピアのベース URL（例: `http://10.0.0.2:8080`）
    peers: Vec<String>,
    server_token: String,
}

impl HttpClusterDispatcher {
    pub fn new(peers: Vec<String>, server_token: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), peers, server_token)
    }

    pub fn with_client(
        client: reqwest::Client,
        peers: Vec<String>,
        server_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            peers: peers
                .into_iter()
                .map(|peer| peer.trim_end_matches('/').to_string())
                .collect(),
            server_token: server_token.into(),
        }
    }

    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    /// 1 ピアへの転送。`Ok(None)` はそのピアが接続を所有していないことを示す
    async fn invoke_peer(
        &self,
        peer: &str,
        call: &ClusterCall,
    ) -> Result<Option<Result<bool, ChatRoomError>>, DispatchError> {
        let url = format!("{}{}", peer, CLUSTER_INVOKE_PATH);
        let response = self
            .client
            .post(&url)
            .header(SERVER_TOKEN_HEADER, &self.server_token)
            .json(call)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(format!("{}: {}", url, e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            StatusCode::UNAUTHORIZED => return Err(DispatchError::Untrusted),
            status if !status.is_success() => {
                return Err(DispatchError::Transport(format!(
                    "{}: unexpected status {}",
                    url, status
                )));
            }
            _ => {}
        }

        let body: ClusterResponseDto = response
            .json()
            .await
            .map_err(|e| DispatchError::Transport(format!("{}: {}", url, e)))?;

        Ok(Some(body.into_result()))
    }
}

#[async_trait]
impl ClusterDispatcher for HttpClusterDispatcher {
    async fn invoke(&self, call: ClusterCall) -> Result<bool, ChatRoomError> {
        let mut last_error = None;

        for peer in &self.peers {
            match self.invoke_peer(peer, &call).await {
                Ok(Some(result)) => {
                    tracing::debug!(
                        "Peer '{}' answered {} for '{}'",
                        peer,
                        call.method,
                        call.connection_id
                    );
                    return result;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Failed to forward {} to '{}': {}", call.method, peer, e);
                    last_error = Some(e);
                }
            }
        }

        let error = last_error
            .unwrap_or_else(|| DispatchError::OwnerNotFound(call.connection_id.to_string()));
        Err(error.into())
    }
}
