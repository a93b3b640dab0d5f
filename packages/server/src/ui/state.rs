//! Server state.

use std::sync::Arc;

use crate::engine::Engine;

/// Shared application state
pub struct AppState {
    /// このノードのチャットルームエンジン
    pub engine: Arc<Engine>,
}
