//! チャットルームエンジン
//!
//! ノードごとに 1 つ。ミドルウェアレジストリ、Room レジストリ、メッセージルーターを所有し、
//! 渡された外部コンポーネント（共有ストア、メッセージバス、接続管理、クラスタ転送、時計）に
//! つなぐ。グローバルな状態は持たないため、1 プロセスに複数のエンジンを置き、
//! `InProcessCluster` でクラスタを組むこともできる。
//!
//! ```ignore
//! let cluster = Arc::new(InProcessCluster::new());
//! let engine = Engine::new(config, store, bus, Arc::new(ChannelConnectionHub::new()), cluster.clone(), clock);
//! cluster.join(&engine).await;
//! let subscriber = engine.start().await;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use hiroba_shared::time::Clock;
use tokio::{sync::RwLock, task::JoinHandle};

use crate::{
    config::ChatRoomConfig,
    domain::{
        ChatRoomError, ClusterCall, ClusterDispatcher, ClusterNode, ClusterOperation, Connection,
        ConnectionHub, ConnectionId, DispatchError, MembershipStore, MessageBus, MiddlewareEntry,
        MiddlewareRegistry, NodeId, PusherChannel,
    },
    usecase::{MessageRouter, MiddlewareChainExecutor, RoomRegistry},
};

/// 1 ノードのチャットルームエンジン
pub struct Engine {
    config: ChatRoomConfig,
    middleware: Arc<RwLock<MiddlewareRegistry>>,
    hub: Arc<dyn ConnectionHub>,
    bus: Arc<dyn MessageBus>,
    router: Arc<MessageRouter>,
    rooms: RoomRegistry,
}

impl Engine {
    pub fn new(
        config: ChatRoomConfig,
        store: Arc<dyn MembershipStore>,
        bus: Arc<dyn MessageBus>,
        hub: Arc<dyn ConnectionHub>,
        dispatcher: Arc<dyn ClusterDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        let middleware = Arc::new(RwLock::new(MiddlewareRegistry::new(
            config.default_middleware_priority,
        )));
        let executor = MiddlewareChainExecutor::new(middleware.clone());
        let router = Arc::new(MessageRouter::new(
            hub.clone(),
            bus.clone(),
            executor.clone(),
            clock.clone(),
            config.server_id.clone(),
            config.server_token.clone(),
        ));
        let rooms = RoomRegistry::new(
            store,
            hub.clone(),
            dispatcher,
            executor,
            router.clone(),
            clock,
            config.server_id.clone(),
        );

        Arc::new(Self {
            config,
            middleware,
            hub,
            bus,
            router,
            rooms,
        })
    }

    pub fn server_id(&self) -> &NodeId {
        &self.config.server_id
    }

    pub fn config(&self) -> &ChatRoomConfig {
        &self.config
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    pub fn router(&self) -> &MessageRouter {
        &self.router
    }

    /// ミドルウェアを登録（同名は置き換え）
    pub async fn add_middleware(&self, entry: MiddlewareEntry) -> Result<(), ChatRoomError> {
        let name = entry.name.clone();
        self.middleware.write().await.register(entry)?;
        tracing::info!("Middleware '{}' registered", name);
        Ok(())
    }

    /// 実行順のミドルウェア名
    pub async fn middleware_order(&self) -> Vec<String> {
        self.middleware.read().await.order().to_vec()
    }

    /// メッセージバスの購読を開始し、開始時の Room を作成
    ///
    /// 購読タスクのハンドルを返す。エンベロープは到着順に 1 つずつ処理する。
    pub async fn start(&self) -> JoinHandle<()> {
        let mut incoming = self.bus.subscribe();
        let router = self.router.clone();
        let server_id = self.config.server_id.clone();
        let subscriber = tokio::spawn(async move {
            while let Some(envelope) = incoming.next().await {
                router.on_incoming(envelope).await;
            }
            tracing::info!("Message bus subscription of '{}' closed", server_id);
        });

        for room in &self.config.starting_rooms {
            match self.rooms.add(room).await {
                Ok(()) => {}
                Err(ChatRoomError::RoomExists(_)) => {
                    tracing::debug!("Starting room '{}' already exists", room);
                }
                Err(e) => tracing::warn!("Failed to create starting room '{}': {}", room, e),
            }
        }

        tracing::info!("Chat room engine '{}' started", self.config.server_id);
        subscriber
    }

    /// 接続をこのノードで保持する（同じ ID を保持済みなら `false`）
    pub async fn connect(&self, connection: Connection, channel: PusherChannel) -> bool {
        let id = connection.id.clone();
        let registered = self.hub.register(connection, channel).await;
        if registered {
            tracing::info!("Connection '{}' connected to '{}'", id, self.config.server_id);
        }
        registered
    }

    /// 所属している全 Room から抜けてから、接続を解放
    pub async fn disconnect(&self, connection_id: &ConnectionId) {
        let Some(connection) = self.hub.get(connection_id).await else {
            return;
        };

        for room in connection.rooms.unwrap_or_default() {
            if let Err(e) = self.rooms.evict_member(connection_id, &room).await {
                tracing::warn!(
                    "Failed to remove '{}' from room '{}' on disconnect: {}",
                    connection_id,
                    room,
                    e
                );
            }
        }

        self.hub.unregister(connection_id).await;
        tracing::info!("Connection '{}' disconnected", connection_id);
    }

    /// このノードが保持する接続のスナップショット
    pub async fn connection(&self, connection_id: &ConnectionId) -> Option<Connection> {
        self.hub.get(connection_id).await
    }

    /// このノードが保持する接続として送信
    pub async fn say(
        &self,
        connection_id: &ConnectionId,
        room: &str,
        message: &str,
    ) -> Result<(), ChatRoomError> {
        let connection = self
            .hub
            .get(connection_id)
            .await
            .ok_or_else(|| DispatchError::OwnerNotFound(connection_id.to_string()))?;
        self.router.broadcast(&connection, room, message).await
    }

    /// サーバ自身として送信（所属チェックなし）
    pub async fn announce(&self, room: &str, message: &str) -> Result<(), ChatRoomError> {
        self.router
            .broadcast(&Connection::system(), room, message)
            .await
    }
}

#[async_trait]
impl ClusterNode for Engine {
    async fn handle_cluster_call(&self, call: &ClusterCall) -> Option<Result<bool, ChatRoomError>> {
        if !self.hub.contains(&call.connection_id).await {
            return None;
        }

        tracing::debug!(
            "Executing forwarded {} for '{}' on '{}'",
            call.method,
            call.connection_id,
            self.config.server_id
        );
        let result = match call.operation() {
            Ok(ClusterOperation::AddMember {
                connection_id,
                room,
            }) => self.rooms.add_member(&connection_id, &room).await,
            Ok(ClusterOperation::RemoveMember {
                connection_id,
                room,
            }) => self.rooms.remove_member(&connection_id, &room).await,
            Ok(ClusterOperation::DismissMember {
                connection_id,
                room,
                notice,
            }) => {
                self.rooms
                    .dismiss_member(&connection_id, &room, notice.as_ref())
                    .await
            }
            Err(e) => Err(e.into()),
        };

        Some(result)
    }
}
