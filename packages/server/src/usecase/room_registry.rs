//! UseCase: Room のライフサイクルとメンバー管理
//!
//! ## 概要
//!
//! - Room の作成・削除・一覧・状態取得（共有ストア）
//! - メンバーの追加・削除（`join` / `leave` ミドルウェアを通す）
//!
//! 接続を保持していないノードで `add_member` / `remove_member` が呼ばれた場合は、
//! 呼び出し（メソッド名と引数）をそのまま `ClusterDispatcher` で所有ノードに転送し、
//! 結果をそのまま返す。`destroy` によるメンバー削除（`dismiss_member`）も同様に転送し、
//! 所有ノードが削除通知を届けてから、所属チェックなしで削除する。
//!
//! ## 既知の競合
//!
//! ストア操作はそれぞれ冪等だが、複数の往復をまたぐロックは取らない。
//!
//! - `add`: 存在確認と追加が別の往復のため、同時に追加すると両方が成功しうる（最終状態は収束する）
//! - `destroy` と `add_member` の並行実行: メンバーハッシュ削除後にメンバーレコードが
//!   書き込まれ、Room のない孤立レコードが残りうる
//! - `add_member` の途中で接続が切断された場合、書き込んだメンバーレコードを消して
//!   `OwnerNotFound` を返す。消すまでの間はレコードが残って見える
//! - `destroy` は途中で失敗してもロールバックしない。存在の判定は `exists` のみが正とする

use std::sync::Arc;

use futures_util::future::join_all;
use hiroba_shared::time::Clock;

use crate::domain::{
    ChatRoomError, ClusterCall, ClusterDispatcher, Connection, ConnectionHub, ConnectionId,
    DispatchError, Member, MembershipStore, MessagePayload, MiddlewareDirection, NodeId,
    ROOM_DELETED_NOTICE, RoomName, RoomStatus,
};

use super::{message_router::MessageRouter, middleware_chain::MiddlewareChainExecutor};

/// Room 管理のユースケース
pub struct RoomRegistry {
    /// 共有ストア（データアクセス層の抽象化）
    store: Arc<dyn MembershipStore>,
    /// このノードが保持する接続
    hub: Arc<dyn ConnectionHub>,
    /// 所有ノードへの転送
    dispatcher: Arc<dyn ClusterDispatcher>,
    middleware: MiddlewareChainExecutor,
    /// Room 削除通知の送信に使う
    router: Arc<MessageRouter>,
    clock: Arc<dyn Clock>,
    server_id: NodeId,
}

impl RoomRegistry {
    pub fn new(
        store: Arc<dyn MembershipStore>,
        hub: Arc<dyn ConnectionHub>,
        dispatcher: Arc<dyn ClusterDispatcher>,
        middleware: MiddlewareChainExecutor,
        router: Arc<MessageRouter>,
        clock: Arc<dyn Clock>,
        server_id: NodeId,
    ) -> Self {
        Self {
            store,
            hub,
            dispatcher,
            middleware,
            router,
            clock,
            server_id,
        }
    }

    /// 登録済みの Room 名一覧
    pub async fn list(&self) -> Result<Vec<RoomName>, ChatRoomError> {
        Ok(self.store.list_rooms().await?)
    }

    pub async fn exists(&self, room: &RoomName) -> Result<bool, ChatRoomError> {
        Ok(self.store.room_exists(room).await?)
    }

    /// Room を作成
    ///
    /// # Returns
    ///
    /// * `Err(ChatRoomError::RoomExists)` - 既に存在する
    pub async fn add(&self, room: &RoomName) -> Result<(), ChatRoomError> {
        if self.exists(room).await? {
            return Err(ChatRoomError::RoomExists(room.to_string()));
        }
        self.store.add_room(room).await?;
        tracing::info!("Room '{}' created", room);
        Ok(())
    }

    /// Room を削除
    ///
    /// 1. 削除通知を組み立てる（`onSayReceive` チェーンを通す）
    /// 2. 現在のメンバーを取得
    /// 3. 各メンバーの所有ノードで、削除通知を届けてからメンバーを削除
    ///    （所属チェックなし、leave ミドルウェアのエラーは削除を止めない）
    /// 4. Room 集合から削除し、メンバーハッシュを削除
    ///
    /// 各ステップはトランザクションではない（ベストエフォートの後始末）。
    pub async fn destroy(&self, room: &RoomName) -> Result<(), ChatRoomError> {
        if !self.exists(room).await? {
            return Err(ChatRoomError::RoomNotExist(room.to_string()));
        }

        let notice = match self
            .router
            .compose(&Connection::system(), room.as_str(), ROOM_DELETED_NOTICE)
            .await
        {
            Ok(notice) => Some(notice),
            Err(e) => {
                tracing::warn!("Failed to announce deletion of room '{}': {}", room, e);
                None
            }
        };

        let members = self.store.members(room).await?;
        let results = join_all(
            members
                .keys()
                .map(|id| self.dismiss_member(id, room, notice.as_ref())),
        )
        .await;
        for (id, result) in members.keys().zip(results) {
            if let Err(e) = result {
                tracing::warn!(
                    "Failed to remove '{}' while destroying room '{}': {}",
                    id,
                    room,
                    e
                );
            }
        }

        self.store.remove_room(room).await?;
        self.store.delete_members(room).await?;
        tracing::info!("Room '{}' destroyed ({} member(s))", room, members.len());

        Ok(())
    }

    /// Room の状態（メンバーは host を除いた形）
    pub async fn room_status(&self, room: &str) -> Result<RoomStatus, ChatRoomError> {
        let room = RoomName::new(room).map_err(|_| ChatRoomError::RoomRequired)?;
        if !self.exists(&room).await? {
            return Err(ChatRoomError::RoomNotExist(room.into_string()));
        }

        let members: std::collections::BTreeMap<_, _> = self
            .store
            .members(&room)
            .await?
            .into_iter()
            .map(|(id, member)| (id, member.sanitize()))
            .collect();

        Ok(RoomStatus {
            room,
            members_count: members.len(),
            members,
        })
    }

    /// 接続を Room に追加
    ///
    /// 接続を保持していない場合は所有ノードに転送する。
    pub async fn add_member(
        &self,
        connection_id: &ConnectionId,
        room: &RoomName,
    ) -> Result<bool, ChatRoomError> {
        let Some(connection) = self.hub.get(connection_id).await else {
            tracing::debug!(
                "Forwarding addMember('{}', '{}') to the owning node",
                connection_id,
                room
            );
            return self
                .dispatcher
                .invoke(ClusterCall::add_member(connection_id, room))
                .await;
        };

        if connection.is_in_room(room) {
            return Err(ChatRoomError::AlreadyInRoom {
                connection: connection_id.to_string(),
                room: room.to_string(),
            });
        }
        if !self.exists(room).await? {
            return Err(ChatRoomError::RoomNotExist(room.to_string()));
        }

        self.middleware
            .run(&connection, room, MiddlewareDirection::Join)
            .await?;

        let member = Member::new(
            connection_id.clone(),
            self.clock.now_millis(),
            self.server_id.clone(),
        );
        self.store.set_member(room, &member).await?;
        if !self.hub.join_room(connection_id, room).await {
            if self.hub.contains(connection_id).await {
                // 並行した add_member が先に参加させた
                return Err(ChatRoomError::AlreadyInRoom {
                    connection: connection_id.to_string(),
                    room: room.to_string(),
                });
            }
            self.store.remove_member(room, connection_id).await?;
            tracing::debug!(
                "Connection '{}' disconnected while joining room '{}'",
                connection_id,
                room
            );
            return Err(DispatchError::OwnerNotFound(connection_id.to_string()).into());
        }
        tracing::info!("Connection '{}' joined room '{}'", connection_id, room);

        Ok(true)
    }

    /// 接続を Room から削除
    ///
    /// 接続を保持していない場合は所有ノードに転送する。
    pub async fn remove_member(
        &self,
        connection_id: &ConnectionId,
        room: &RoomName,
    ) -> Result<bool, ChatRoomError> {
        let Some(connection) = self.hub.get(connection_id).await else {
            tracing::debug!(
                "Forwarding removeMember('{}', '{}') to the owning node",
                connection_id,
                room
            );
            return self
                .dispatcher
                .invoke(ClusterCall::remove_member(connection_id, room))
                .await;
        };

        if !connection.is_in_room(room) {
            return Err(ChatRoomError::NotInRoom {
                connection: connection_id.to_string(),
                room: room.to_string(),
            });
        }
        if !self.exists(room).await? {
            return Err(ChatRoomError::RoomNotExist(room.to_string()));
        }
        self.middleware
            .run(&connection, room, MiddlewareDirection::Leave)
            .await?;

        self.release(connection_id, room).await
    }

    /// 切断時の後始末としての削除
    ///
    /// `destroy` と同じく所属チェックを行わず、leave ミドルウェアの拒否では止まらない。
    pub async fn evict_member(
        &self,
        connection_id: &ConnectionId,
        room: &RoomName,
    ) -> Result<bool, ChatRoomError> {
        self.dismiss_member(connection_id, room, None).await
    }

    /// Room の削除に伴うメンバー削除
    ///
    /// 所属チェックを行わず、leave ミドルウェアの拒否では止まらない。`notice` があれば
    /// 削除の前にその接続に届ける（`say` チェーンを通す）。接続を保持していない場合は
    /// 所有ノードに転送する。
    pub async fn dismiss_member(
        &self,
        connection_id: &ConnectionId,
        room: &RoomName,
        notice: Option<&MessagePayload>,
    ) -> Result<bool, ChatRoomError> {
        let Some(connection) = self.hub.get(connection_id).await else {
            tracing::debug!(
                "Forwarding dismissMember('{}', '{}') to the owning node",
                connection_id,
                room
            );
            return self
                .dispatcher
                .invoke(ClusterCall::dismiss_member(connection_id, room, notice))
                .await;
        };

        if let Some(notice) = notice {
            self.router.deliver_to(&connection, notice).await;
        }
        if let Err(e) = self
            .middleware
            .run(&connection, room, MiddlewareDirection::Leave)
            .await
        {
            tracing::debug!(
                "Leave middleware rejected '{}' during teardown of '{}': {}",
                connection_id,
                room,
                e
            );
        }

        self.release(connection_id, room).await
    }

    async fn release(
        &self,
        connection_id: &ConnectionId,
        room: &RoomName,
    ) -> Result<bool, ChatRoomError> {
        self.store.remove_member(room, connection_id).await?;
        self.hub.leave_room(connection_id, room).await;
        tracing::info!("Connection '{}' left room '{}'", connection_id, room);

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            DispatchError, MessageBus, MiddlewareEntry, MiddlewareRegistry, cluster::MockClusterDispatcher,
            message_bus::MockMessageBus,
        },
        infrastructure::{
            connection_hub::ChannelConnectionHub, message_bus::LocalMessageBus,
            repository::InMemoryMembershipStore,
        },
    };
    use hiroba_shared::time::FixedClock;
    use tokio::sync::{RwLock, mpsc};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - Room の作成・存在確認・重複作成エラー・削除
    // - メンバー追加 / 削除が共有ストアと接続の Room 列の両方に反映されること
    // - join / leave ミドルウェアによる拒否
    // - 保持していない接続の操作が ClusterDispatcher に転送されること
    //
    // 【どのようなシナリオをテストするか】
    // 1. add → exists が true、2 回目の add は RoomExists
    // 2. addMember / removeMember の正常系とガード
    // 3. destroy で各メンバーに削除通知が 1 回届き、メンバーも Room も消える
    //    （他ノードのメンバーは dismissMember で所有ノードに転送）
    // 4. 他ノードの接続 c1 の addMember が ("api.chatRoom.addMember", ["c1","lobby"], "c1") で転送される
    // ========================================

    const NOW: i64 = 1_700_000_000_000;

    struct Fixture {
        registry: RoomRegistry,
        store: Arc<InMemoryMembershipStore>,
        hub: Arc<ChannelConnectionHub>,
        middleware: Arc<RwLock<MiddlewareRegistry>>,
    }

    fn create_fixture_with(
        bus: Arc<dyn MessageBus>,
        dispatcher: Arc<dyn ClusterDispatcher>,
    ) -> Fixture {
        let store = Arc::new(InMemoryMembershipStore::default());
        let hub = Arc::new(ChannelConnectionHub::new());
        let middleware = Arc::new(RwLock::new(MiddlewareRegistry::new(100)));
        let executor = MiddlewareChainExecutor::new(middleware.clone());
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(NOW));
        let server_id = NodeId::new("node-a").unwrap();
        let router = Arc::new(MessageRouter::new(
            hub.clone(),
            bus,
            executor.clone(),
            clock.clone(),
            server_id.clone(),
            "token".to_string(),
        ));
        let registry = RoomRegistry::new(
            store.clone(),
            hub.clone(),
            dispatcher,
            executor,
            router,
            clock,
            server_id,
        );
        Fixture {
            registry,
            store,
            hub,
            middleware,
        }
    }

    fn create_fixture() -> Fixture {
        let mut dispatcher = MockClusterDispatcher::new();
        dispatcher.expect_invoke().returning(|call| {
            Err(DispatchError::OwnerNotFound(call.connection_id.to_string()).into())
        });
        create_fixture_with(Arc::new(LocalMessageBus::new()), Arc::new(dispatcher))
    }

    fn id(value: &str) -> ConnectionId {
        ConnectionId::new(value).unwrap()
    }

    fn room(value: &str) -> RoomName {
        RoomName::new(value).unwrap()
    }

    async fn connect(hub: &ChannelConnectionHub, value: &str) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        hub.register(Connection::new(id(value)), tx).await;
        rx
    }

    #[tokio::test]
    async fn test_add_then_exists() {
        // テスト項目: add に成功した Room は exists が true になる
        // given (前提条件):
        let fixture = create_fixture();

        // when (操作):
        let result = fixture.registry.add(&room("lobby")).await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert!(fixture.registry.exists(&room("lobby")).await.unwrap());
        assert_eq!(fixture.registry.list().await.unwrap(), vec![room("lobby")]);
    }

    #[tokio::test]
    async fn test_add_existing_room_fails_without_duplicating() {
        // テスト項目: 既存の Room の add は RoomExists になり、状態は重複しない
        // given (前提条件):
        let fixture = create_fixture();
        fixture.registry.add(&room("lobby")).await.unwrap();

        // when (操作):
        let result = fixture.registry.add(&room("lobby")).await;

        // then (期待する結果):
        assert_eq!(result, Err(ChatRoomError::RoomExists("lobby".to_string())));
        assert_eq!(fixture.registry.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_member_updates_store_and_connection() {
        // テスト項目: addMember 成功後、接続の Room 列とストアのメンバーレコードの両方に反映される
        // given (前提条件):
        let fixture = create_fixture();
        fixture.registry.add(&room("lobby")).await.unwrap();
        let _rx = connect(&fixture.hub, "c1").await;

        // when (操作):
        let result = fixture.registry.add_member(&id("c1"), &room("lobby")).await;

        // then (期待する結果):
        assert_eq!(result, Ok(true));
        let connection = fixture.hub.get(&id("c1")).await.unwrap();
        assert!(connection.is_in_room(&room("lobby")));
        let members = fixture.store.members(&room("lobby")).await.unwrap();
        assert_eq!(
            members.get(&id("c1")),
            Some(&Member::new(id("c1"), NOW, NodeId::new("node-a").unwrap()))
        );
    }

    #[tokio::test]
    async fn test_add_member_twice_fails_and_leaves_state_unchanged() {
        // テスト項目: 既に所属している Room への addMember は AlreadyInRoom で、状態は変わらない
        // given (前提条件):
        let fixture = create_fixture();
        fixture.registry.add(&room("lobby")).await.unwrap();
        let _rx = connect(&fixture.hub, "c1").await;
        fixture
            .registry
            .add_member(&id("c1"), &room("lobby"))
            .await
            .unwrap();

        // when (操作):
        let result = fixture.registry.add_member(&id("c1"), &room("lobby")).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ChatRoomError::AlreadyInRoom {
                connection: "c1".to_string(),
                room: "lobby".to_string()
            })
        );
        assert_eq!(
            fixture.hub.get(&id("c1")).await.unwrap().rooms,
            Some(vec![room("lobby")])
        );
        assert_eq!(fixture.store.members(&room("lobby")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_member_to_missing_room_fails() {
        // テスト項目: 存在しない Room への addMember は RoomNotExist になる
        // given (前提条件):
        let fixture = create_fixture();
        let _rx = connect(&fixture.hub, "c1").await;

        // when (操作):
        let result = fixture.registry.add_member(&id("c1"), &room("nowhere")).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ChatRoomError::RoomNotExist("nowhere".to_string()))
        );
    }

    #[tokio::test]
    async fn test_join_middleware_rejection_keeps_connection_out() {
        // テスト項目: join ミドルウェアが拒否すると、メンバーレコードも Room 列も作られない
        // given (前提条件):
        let fixture = create_fixture();
        fixture.registry.add(&room("vip")).await.unwrap();
        let _rx = connect(&fixture.hub, "c1").await;
        fixture
            .middleware
            .write()
            .await
            .register(MiddlewareEntry::new("vip-only").join(|_, room: RoomName| async move {
                if room.as_str() == "vip" {
                    Err(ChatRoomError::middleware("members only"))
                } else {
                    Ok(())
                }
            }))
            .unwrap();

        // when (操作):
        let result = fixture.registry.add_member(&id("c1"), &room("vip")).await;

        // then (期待する結果):
        assert_eq!(result, Err(ChatRoomError::middleware("members only")));
        assert!(!fixture.hub.get(&id("c1")).await.unwrap().is_in_room(&room("vip")));
        assert!(fixture.store.members(&room("vip")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_member_clears_store_and_connection() {
        // テスト項目: removeMember 成功後、Room 列からもストアからも消える
        // given (前提条件):
        let fixture = create_fixture();
        fixture.registry.add(&room("lobby")).await.unwrap();
        let _rx = connect(&fixture.hub, "c1").await;
        fixture
            .registry
            .add_member(&id("c1"), &room("lobby"))
            .await
            .unwrap();

        // when (操作):
        let result = fixture
            .registry
            .remove_member(&id("c1"), &room("lobby"))
            .await;

        // then (期待する結果):
        assert_eq!(result, Ok(true));
        assert!(!fixture.hub.get(&id("c1")).await.unwrap().is_in_room(&room("lobby")));
        assert!(fixture.store.members(&room("lobby")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_member_not_in_room_fails() {
        // テスト項目: 所属していない Room からの removeMember は NotInRoom になる
        // given (前提条件):
        let fixture = create_fixture();
        fixture.registry.add(&room("lobby")).await.unwrap();
        let _rx = connect(&fixture.hub, "c1").await;

        // when (操作):
        let result = fixture
            .registry
            .remove_member(&id("c1"), &room("lobby"))
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ChatRoomError::NotInRoom {
                connection: "c1".to_string(),
                room: "lobby".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_leave_middleware_can_block_remove_member() {
        // テスト項目: leave ミドルウェアが拒否すると通常の removeMember は失敗し、所属は残る
        // given (前提条件):
        let fixture = create_fixture();
        fixture.registry.add(&room("lobby")).await.unwrap();
        let _rx = connect(&fixture.hub, "c1").await;
        fixture
            .registry
            .add_member(&id("c1"), &room("lobby"))
            .await
            .unwrap();
        fixture
            .middleware
            .write()
            .await
            .register(
                MiddlewareEntry::new("no-escape")
                    .leave(|_, _| async { Err(ChatRoomError::middleware("stay")) }),
            )
            .unwrap();

        // when (操作):
        let result = fixture
            .registry
            .remove_member(&id("c1"), &room("lobby"))
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(ChatRoomError::middleware("stay")));
        assert!(fixture.hub.get(&id("c1")).await.unwrap().is_in_room(&room("lobby")));
    }

    #[tokio::test]
    async fn test_room_status_sanitizes_members() {
        // テスト項目: roomStatus はメンバー数と host を除いたメンバー情報を返す
        // given (前提条件):
        let fixture = create_fixture();
        fixture.registry.add(&room("lobby")).await.unwrap();
        let _rx1 = connect(&fixture.hub, "c1").await;
        let _rx2 = connect(&fixture.hub, "c2").await;
        fixture.registry.add_member(&id("c1"), &room("lobby")).await.unwrap();
        fixture.registry.add_member(&id("c2"), &room("lobby")).await.unwrap();

        // when (操作):
        let status = fixture.registry.room_status("lobby").await.unwrap();

        // then (期待する結果):
        assert_eq!(status.room, room("lobby"));
        assert_eq!(status.members_count, 2);
        assert_eq!(
            serde_json::to_value(&status.members).unwrap(),
            serde_json::json!({
                "c1": { "id": "c1", "joinedAt": NOW },
                "c2": { "id": "c2", "joinedAt": NOW }
            })
        );
    }

    #[tokio::test]
    async fn test_room_status_errors() {
        // テスト項目: 空の Room 名は RoomRequired、存在しない Room は RoomNotExist
        // given (前提条件):
        let fixture = create_fixture();

        // when (操作):
        let empty = fixture.registry.room_status("").await;
        let missing = fixture.registry.room_status("nowhere").await;

        // then (期待する結果):
        assert_eq!(empty, Err(ChatRoomError::RoomRequired));
        assert_eq!(
            missing,
            Err(ChatRoomError::RoomNotExist("nowhere".to_string()))
        );
    }

    #[tokio::test]
    async fn test_destroy_missing_room_fails() {
        // テスト項目: 存在しない Room の destroy は RoomNotExist になる
        // given (前提条件):
        let fixture = create_fixture();

        // when (操作):
        let result = fixture.registry.destroy(&room("nowhere")).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ChatRoomError::RoomNotExist("nowhere".to_string()))
        );
    }

    #[tokio::test]
    async fn test_destroy_notifies_members_and_cleans_up() {
        // テスト項目: destroy は各メンバーに削除通知を 1 回だけ届けてから、メンバーと Room を削除する
        //            leave ミドルウェアが拒否しても削除は止まらない
        // given (前提条件):
        let mut bus = MockMessageBus::new();
        bus.expect_publish().times(0);
        let mut dispatcher = MockClusterDispatcher::new();
        dispatcher.expect_invoke().times(0);
        let fixture = create_fixture_with(Arc::new(bus), Arc::new(dispatcher));
        fixture.registry.add(&room("lobby")).await.unwrap();
        let mut rx1 = connect(&fixture.hub, "c1").await;
        let mut rx2 = connect(&fixture.hub, "c2").await;
        fixture.registry.add_member(&id("c1"), &room("lobby")).await.unwrap();
        fixture.registry.add_member(&id("c2"), &room("lobby")).await.unwrap();
        fixture
            .middleware
            .write()
            .await
            .register(
                MiddlewareEntry::new("no-escape")
                    .leave(|_, _| async { Err(ChatRoomError::middleware("stay")) }),
            )
            .unwrap();

        // when (操作):
        let result = fixture.registry.destroy(&room("lobby")).await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert!(!fixture.registry.exists(&room("lobby")).await.unwrap());
        assert!(fixture.store.members(&room("lobby")).await.unwrap().is_empty());
        for (value, rx) in [("c1", &mut rx1), ("c2", &mut rx2)] {
            assert!(!fixture.hub.get(&id(value)).await.unwrap().is_in_room(&room("lobby")));
            let notice: serde_json::Value =
                serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
            assert_eq!(notice["type"], "say");
            assert_eq!(notice["message"], ROOM_DELETED_NOTICE);
            assert_eq!(notice["room"], "lobby");
            assert_eq!(notice["from"], "0");
            assert!(rx.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn test_destroy_dismisses_remote_member_with_notice() {
        // テスト項目: 他ノードが保持するメンバーは dismissMember（削除通知付き）で所有ノードに転送される
        // given (前提条件):
        let mut dispatcher = MockClusterDispatcher::new();
        dispatcher
            .expect_invoke()
            .withf(|call| {
                call.method == "api.chatRoom.dismissMember"
                    && call.args[..3] == ["c9", "lobby", ROOM_DELETED_NOTICE]
                    && call.connection_id.as_str() == "c9"
            })
            .times(1)
            .returning(|_| Ok(true));
        let fixture = create_fixture_with(Arc::new(LocalMessageBus::new()), Arc::new(dispatcher));
        fixture.registry.add(&room("lobby")).await.unwrap();
        fixture
            .store
            .set_member(
                &room("lobby"),
                &Member::new(id("c9"), NOW, NodeId::new("node-b").unwrap()),
            )
            .await
            .unwrap();

        // when (操作):
        let result = fixture.registry.destroy(&room("lobby")).await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert!(fixture.store.members(&room("lobby")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_destroy_empty_room() {
        // テスト項目: メンバーが 0 人でも Room を削除する（通知の送り先はない）
        // given (前提条件):
        let mut bus = MockMessageBus::new();
        bus.expect_publish().times(0);
        let mut dispatcher = MockClusterDispatcher::new();
        dispatcher.expect_invoke().times(0);
        let fixture = create_fixture_with(Arc::new(bus), Arc::new(dispatcher));
        fixture.registry.add(&room("empty")).await.unwrap();

        // when (操作):
        let result = fixture.registry.destroy(&room("empty")).await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert!(!fixture.registry.exists(&room("empty")).await.unwrap());
        assert!(fixture.store.members(&room("empty")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_member_disconnected_midway_leaves_no_record() {
        // テスト項目: join ミドルウェアの実行中に切断された接続のメンバーレコードは残らない
        // given (前提条件):
        let fixture = create_fixture();
        fixture.registry.add(&room("lobby")).await.unwrap();
        let _rx = connect(&fixture.hub, "c1").await;
        let hub = fixture.hub.clone();
        fixture
            .middleware
            .write()
            .await
            .register(MiddlewareEntry::new("hang-up").join(move |connection: Connection, _| {
                let hub = hub.clone();
                async move {
                    hub.unregister(&connection.id).await;
                    Ok(())
                }
            }))
            .unwrap();

        // when (操作):
        let result = fixture.registry.add_member(&id("c1"), &room("lobby")).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(DispatchError::OwnerNotFound("c1".to_string()).into())
        );
        assert!(fixture.store.members(&room("lobby")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_member_for_remote_connection_is_forwarded_verbatim() {
        // テスト項目: 保持していない接続 c1 の addMember は
        //            ("api.chatRoom.addMember", ["c1","lobby"], "c1") で転送され、結果がそのまま返る
        // given (前提条件):
        let mut dispatcher = MockClusterDispatcher::new();
        dispatcher
            .expect_invoke()
            .withf(|call| {
                call.method == "api.chatRoom.addMember"
                    && call.args == ["c1", "lobby"]
                    && call.connection_id.as_str() == "c1"
            })
            .times(1)
            .returning(|_| Ok(true));
        let fixture = create_fixture_with(Arc::new(LocalMessageBus::new()), Arc::new(dispatcher));

        // when (操作):
        let result = fixture.registry.add_member(&id("c1"), &room("lobby")).await;

        // then (期待する結果):
        assert_eq!(result, Ok(true));
    }

    #[tokio::test]
    async fn test_remote_error_is_relayed_unchanged() {
        // テスト項目: 所有ノードが返したエラーはそのまま呼び出し元に返る
        // given (前提条件):
        let mut dispatcher = MockClusterDispatcher::new();
        dispatcher
            .expect_invoke()
            .withf(|call| call.method == "api.chatRoom.removeMember")
            .times(1)
            .returning(|_| {
                Err(ChatRoomError::NotInRoom {
                    connection: "c9".to_string(),
                    room: "lobby".to_string(),
                })
            });
        let fixture = create_fixture_with(Arc::new(LocalMessageBus::new()), Arc::new(dispatcher));

        // when (操作):
        let result = fixture
            .registry
            .remove_member(&id("c9"), &room("lobby"))
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ChatRoomError::NotInRoom {
                connection: "c9".to_string(),
                room: "lobby".to_string()
            })
        );
    }
}
