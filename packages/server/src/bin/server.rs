//! Chat room node.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-server
//! cargo run --bin hiroba-server -- --port 3000 --room lobby --room kitchen
//! cargo run --bin hiroba-server -- --port 3001 --server-token s3cret --peer http://127.0.0.1:3000
//! ```

use std::sync::Arc;

use clap::Parser;
use hiroba_server::{
    config::{ChatRoomConfig, DEFAULT_MIDDLEWARE_PRIORITY, DEFAULT_SERVER_TOKEN},
    domain::{ClusterDispatcher, NodeId, RoomName},
    engine::Engine,
    infrastructure::{
        cluster::{HttpClusterDispatcher, InProcessCluster},
        connection_hub::ChannelConnectionHub,
        message_bus::LocalMessageBus,
        repository::InMemoryMembershipStore,
    },
    ui::Server,
};
use hiroba_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "hiroba-server")]
#[command(about = "Chat room node with cluster-wide rooms and middleware", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Identity of this node (generated when omitted)
    #[arg(long)]
    server_id: Option<String>,

    /// Shared secret of the cluster
    #[arg(long, default_value = DEFAULT_SERVER_TOKEN)]
    server_token: String,

    /// Room created at startup (repeatable)
    #[arg(long = "room")]
    rooms: Vec<String>,

    /// Base URL of another node to forward calls to (repeatable)
    #[arg(long = "peer")]
    peers: Vec<String>,

    /// Priority given to middleware registered without one
    #[arg(long, default_value_t = DEFAULT_MIDDLEWARE_PRIORITY)]
    default_middleware_priority: i64,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn build_config(args: &Args) -> Result<ChatRoomConfig, String> {
    let server_id = match &args.server_id {
        Some(id) => NodeId::new(id.as_str()).map_err(|e| e.to_string())?,
        None => NodeId::generate(),
    };
    let starting_rooms = args
        .rooms
        .iter()
        .map(|room| RoomName::new(room.as_str()).map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ChatRoomConfig::default()
        .with_server_id(server_id)
        .with_server_token(args.server_token.clone())
        .with_starting_rooms(starting_rooms)
        .with_default_middleware_priority(args.default_middleware_priority))
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    // Initialize dependencies in order:
    // 1. Shared store and message bus
    // 2. Cluster dispatcher
    // 3. Engine
    // 4. Server

    // 1. The in-memory store and bus are shared by the engines of this process only
    let store = Arc::new(InMemoryMembershipStore::new(config.keys.clone()));
    let bus = Arc::new(LocalMessageBus::new());

    // 2. Forward to peers over HTTP, or stay within this process
    let local_cluster = args.peers.is_empty().then(|| Arc::new(InProcessCluster::new()));
    let dispatcher: Arc<dyn ClusterDispatcher> = if let Some(cluster) = &local_cluster {
        cluster.clone()
    } else {
        tracing::info!("Forwarding cluster calls to {:?}", args.peers);
        Arc::new(HttpClusterDispatcher::new(
            args.peers.clone(),
            config.server_token.clone(),
        ))
    };

    // 3. Create the engine and subscribe to the bus
    let engine = Engine::new(
        config,
        store,
        bus,
        Arc::new(ChannelConnectionHub::new()),
        dispatcher,
        Arc::new(SystemClock),
    );
    if let Some(cluster) = &local_cluster {
        cluster.join(&engine).await;
    }
    let subscriber = engine.start().await;

    // 4. Create and run the server
    let server = Server::new(engine);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        subscriber.abort();
        std::process::exit(1);
    }
    subscriber.abort();
}
