//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{engine::Engine, infrastructure::dto::cluster::CLUSTER_INVOKE_PATH};

use super::{
    handler::{
        add_member, broadcast_message, create_room, destroy_room, get_room_status, get_rooms,
        health_check, invoke_cluster_call, remove_member, websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Build the HTTP / WebSocket routes of one node.
pub fn router(engine: Arc<Engine>) -> Router {
    let app_state = Arc::new(AppState { engine });

    Router::new()
        // WebSocket エンドポイント
        .route("/ws", get(websocket_handler))
        // HTTP エンドポイント
        .route("/api/health", get(health_check))
        .route("/api/rooms", get(get_rooms).post(create_room))
        .route(
            "/api/rooms/{room}",
            get(get_room_status).delete(destroy_room),
        )
        .route("/api/rooms/{room}/members", post(add_member))
        .route(
            "/api/rooms/{room}/members/{connection_id}",
            delete(remove_member),
        )
        .route("/api/rooms/{room}/messages", post(broadcast_message))
        // クラスタ内部エンドポイント
        .route(CLUSTER_INVOKE_PATH, post(invoke_cluster_call))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Chat room server of one node
///
/// # Example
///
/// ```ignore
/// let server = Server::new(engine);
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    engine: Arc<Engine>,
}

impl Server {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    /// Run the server on `host:port` until a shutdown signal arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(
        self,
        host: String,
        port: u16,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until a shutdown signal arrives.
    pub async fn serve(
        self,
        listener: TcpListener,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let app = router(self.engine.clone());

        tracing::info!(
            "Chat room node '{}' listening on {}",
            self.engine.server_id(),
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws", listener.local_addr()?);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
