//! 同一プロセス内のノードに転送する ClusterDispatcher 実装
//!
//! ノード（`Engine`）はこのディスパッチャを保持するため、ディスパッチャ側は
//! `Weak` 参照で持ち、循環参照を避ける。

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{ChatRoomError, ClusterCall, ClusterDispatcher, ClusterNode, DispatchError};

/// 同一プロセス内のクラスタ
#[derive(Default)]
pub struct InProcessCluster {
    nodes: RwLock<Vec<Weak<dyn ClusterNode>>>,
}

impl InProcessCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// ノードをクラスタに参加させる
    pub async fn join<N: ClusterNode + 'static>(&self, node: &Arc<N>) {
        let node: Weak<N> = Arc::downgrade(node);
        let node: Weak<dyn ClusterNode> = node;
        let mut nodes = self.nodes.write().await;
        nodes.retain(|n| n.strong_count() > 0);
        nodes.push(node);
    }

    /// 生存しているノード数
    pub async fn len(&self) -> usize {
        self.nodes
            .read()
            .await
            .iter()
            .filter(|n| n.strong_count() > 0)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ClusterDispatcher for InProcessCluster {
    async fn invoke(&self, call: ClusterCall) -> Result<bool, ChatRoomError> {
        // 呼び出し中にロックを保持しない（所有ノードがさらに転送する場合がある）
        let nodes: Vec<Arc<dyn ClusterNode>> = self
            .nodes
            .read()
            .await
            .iter()
            .filter_map(Weak::upgrade)
            .collect();

        for node in nodes {
            if let Some(result) = node.handle_cluster_call(&call).await {
                return result;
            }
        }

        tracing::warn!(
            "No node owns connection '{}' for {}",
            call.connection_id,
            call.method
        );
        Err(DispatchError::OwnerNotFound(call.connection_id.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionId, RoomName};

    /// 指定した接続だけを所有するノード
    struct StubNode {
        owns: &'static str,
    }

    #[async_trait]
    impl ClusterNode for StubNode {
        async fn handle_cluster_call(
            &self,
            call: &ClusterCall,
        ) -> Option<Result<bool, ChatRoomError>> {
            (call.connection_id.as_str() == self.owns).then_some(Ok(true))
        }
    }

    fn call_for(id: &str) -> ClusterCall {
        ClusterCall::add_member(
            &ConnectionId::new(id).unwrap(),
            &RoomName::new("lobby").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_owner_answers() {
        // テスト項目: 接続を所有するノードの結果が返る
        // given (前提条件):
        let cluster = InProcessCluster::new();
        let a = Arc::new(StubNode { owns: "c1" });
        let b = Arc::new(StubNode { owns: "c2" });
        cluster.join(&a).await;
        cluster.join(&b).await;

        // when (操作):
        let result = cluster.invoke(call_for("c2")).await;

        // then (期待する結果):
        assert_eq!(result, Ok(true));
    }

    #[tokio::test]
    async fn test_no_owner_is_an_error() {
        // テスト項目: どのノードも所有していない接続は OwnerNotFound
        // given (前提条件):
        let cluster = InProcessCluster::new();
        let a = Arc::new(StubNode { owns: "c1" });
        cluster.join(&a).await;

        // when (操作):
        let result = cluster.invoke(call_for("c9")).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(DispatchError::OwnerNotFound("c9".to_string()).into())
        );
    }

    #[tokio::test]
    async fn test_dropped_node_is_skipped() {
        // テスト項目: 破棄されたノードには転送されない
        // given (前提条件):
        let cluster = InProcessCluster::new();
        let a = Arc::new(StubNode { owns: "c1" });
        cluster.join(&a).await;
        drop(a);

        // when (操作):
        let result = cluster.invoke(call_for("c1")).await;

        // then (期待する結果):
        assert!(cluster.is_empty().await);
        assert!(matches!(
            result,
            Err(ChatRoomError::Dispatch(DispatchError::OwnerNotFound(_)))
        ));
    }
}
