//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use hiroba_server::{
    config::ChatRoomConfig,
    domain::{ClusterDispatcher, Connection, ConnectionId, NodeId, RoomName},
    engine::Engine,
    infrastructure::{
        cluster::InProcessCluster, connection_hub::ChannelConnectionHub,
        message_bus::LocalMessageBus, repository::InMemoryMembershipStore,
    },
    ui::router,
};
use hiroba_shared::time::FixedClock;
use tokio::{net::TcpListener, sync::mpsc};

pub const NOW: i64 = 1_700_000_000_000;
pub const TOKEN: &str = "integration-token";

pub fn room(value: &str) -> RoomName {
    RoomName::new(value).unwrap()
}

pub fn id(value: &str) -> ConnectionId {
    ConnectionId::new(value).unwrap()
}

pub fn config(server_id: &str, starting_rooms: &[&str]) -> ChatRoomConfig {
    ChatRoomConfig::default()
        .with_server_id(NodeId::new(server_id).unwrap())
        .with_server_token(TOKEN)
        .with_starting_rooms(starting_rooms.iter().map(|r| room(r)).collect())
}

/// Store and bus shared by every node, as the external key-value store and pub/sub
/// channel would be.
pub struct SharedBackend {
    pub store: Arc<InMemoryMembershipStore>,
    pub bus: Arc<LocalMessageBus>,
}

impl SharedBackend {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryMembershipStore::default()),
            bus: Arc::new(LocalMessageBus::new()),
        }
    }

    pub async fn node(
        &self,
        server_id: &str,
        starting_rooms: &[&str],
        dispatcher: Arc<dyn ClusterDispatcher>,
    ) -> Arc<Engine> {
        let engine = Engine::new(
            config(server_id, starting_rooms),
            self.store.clone(),
            self.bus.clone(),
            Arc::new(ChannelConnectionHub::new()),
            dispatcher,
            Arc::new(FixedClock::new(NOW)),
        );
        let _subscriber = engine.start().await;
        engine
    }
}

/// Nodes of one process joined through an `InProcessCluster`
pub async fn in_process_cluster(
    server_ids: &[&str],
    starting_rooms: &[&str],
) -> (Vec<Arc<Engine>>, SharedBackend) {
    let backend = SharedBackend::new();
    let cluster = Arc::new(InProcessCluster::new());

    let mut engines = Vec::new();
    for server_id in server_ids {
        let engine = backend
            .node(server_id, starting_rooms, cluster.clone())
            .await;
        cluster.join(&engine).await;
        engines.push(engine);
    }
    (engines, backend)
}

/// Hold a connection on `engine` and return its outbound channel.
pub async fn connect(engine: &Engine, connection_id: &str) -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    assert!(engine.connect(Connection::new(id(connection_id)), tx).await);
    rx
}

pub async fn recv_json(rx: &mut mpsc::UnboundedReceiver<String>) -> serde_json::Value {
    let text = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for a message")
        .expect("channel closed");
    serde_json::from_str(&text).unwrap()
}

/// `true` if nothing arrives within a short grace period
pub async fn stays_silent(rx: &mut mpsc::UnboundedReceiver<String>) -> bool {
    tokio::time::timeout(Duration::from_millis(100), rx.recv())
        .await
        .is_err()
}

/// Bind an ephemeral port for a node before it is built.
pub async fn bind() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Serve `engine` on `listener` in the background.
pub fn serve(engine: Arc<Engine>, listener: TcpListener) {
    tokio::spawn(async move {
        axum::serve(listener, router(engine)).await.unwrap();
    });
}

pub async fn spawn_node(engine: Arc<Engine>) -> SocketAddr {
    let (listener, addr) = bind().await;
    serve(engine, listener);
    addr
}
