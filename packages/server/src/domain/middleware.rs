//! チャットルームのミドルウェア
//!
//! ミドルウェアは名前付きのハンドラの組で、方向ごとに最大 1 つずつ（計 4 つ）持てる。
//! レジストリは名前ごとにエントリを保持し、優先度の昇順に並べた実行順を持つ。
//!
//! ## 実行順
//!
//! 登録のたびに安定ソートで並べ直すため、同じ優先度のエントリは最初に登録した順になる。
//! 同名の再登録はエントリ（と優先度）を置き換え、実行順に名前は重複しない。

use std::{collections::HashMap, fmt, future::Future, sync::Arc};

use futures_util::future::BoxFuture;

use super::{
    entity::{Connection, MessagePayload},
    error::ChatRoomError,
    value_object::RoomName,
};

/// ペイロードハンドラの結果（`Some` で置き換え、`None` で維持）
pub type PayloadResult = Result<Option<MessagePayload>, ChatRoomError>;

/// `onSayReceive` / `say` 方向のハンドラ
pub type PayloadHandler =
    Arc<dyn Fn(Connection, RoomName, MessagePayload) -> BoxFuture<'static, PayloadResult> + Send + Sync>;

/// `join` / `leave` 方向のハンドラ
pub type MembershipHandler =
    Arc<dyn Fn(Connection, RoomName) -> BoxFuture<'static, Result<(), ChatRoomError>> + Send + Sync>;

/// ハンドラを差し込む方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MiddlewareDirection {
    /// メッセージバスに publish する前
    OnSayReceive,
    /// このノードの接続 1 つに配信する前
    Say,
    Join,
    Leave,
}

impl MiddlewareDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnSayReceive => "onSayReceive",
            Self::Say => "say",
            Self::Join => "join",
            Self::Leave => "leave",
        }
    }
}

impl fmt::Display for MiddlewareDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 登録済みのハンドラ
#[derive(Clone)]
pub enum MiddlewareHandler {
    Payload(PayloadHandler),
    Membership(MembershipHandler),
}

/// 名前と優先度を持つミドルウェア（小さいほど先に実行）
///
/// ```ignore
/// let entry = MiddlewareEntry::new("no-shouting")
///     .with_priority(10)
///     .on_say_receive(|_connection, _room, mut payload| async move {
///         payload.message = payload.message.to_lowercase();
///         Ok(Some(payload))
///     });
/// ```
#[derive(Clone)]
pub struct MiddlewareEntry {
    pub name: String,
    /// `None`（または 0）は設定のデフォルト優先度になる
    pub priority: Option<i64>,
    on_say_receive: Option<PayloadHandler>,
    say: Option<PayloadHandler>,
    join: Option<MembershipHandler>,
    leave: Option<MembershipHandler>,
}

impl MiddlewareEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: None,
            on_say_receive: None,
            say: None,
            join: None,
            leave: None,
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn on_say_receive<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Connection, RoomName, MessagePayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PayloadResult> + Send + 'static,
    {
        self.on_say_receive = Some(payload_handler(handler));
        self
    }

    pub fn say<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Connection, RoomName, MessagePayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PayloadResult> + Send + 'static,
    {
        self.say = Some(payload_handler(handler));
        self
    }

    pub fn join<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Connection, RoomName) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ChatRoomError>> + Send + 'static,
    {
        self.join = Some(membership_handler(handler));
        self
    }

    pub fn leave<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Connection, RoomName) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ChatRoomError>> + Send + 'static,
    {
        self.leave = Some(membership_handler(handler));
        self
    }

    /// `direction` のハンドラ
    pub fn handler(&self, direction: MiddlewareDirection) -> Option<MiddlewareHandler> {
        match direction {
            MiddlewareDirection::OnSayReceive => self
                .on_say_receive
                .clone()
                .map(MiddlewareHandler::Payload),
            MiddlewareDirection::Say => self.say.clone().map(MiddlewareHandler::Payload),
            MiddlewareDirection::Join => self.join.clone().map(MiddlewareHandler::Membership),
            MiddlewareDirection::Leave => self.leave.clone().map(MiddlewareHandler::Membership),
        }
    }
}

impl fmt::Debug for MiddlewareEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareEntry")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("on_say_receive", &self.on_say_receive.is_some())
            .field("say", &self.say.is_some())
            .field("join", &self.join.is_some())
            .field("leave", &self.leave.is_some())
            .finish()
    }
}

fn payload_handler<F, Fut>(handler: F) -> PayloadHandler
where
    F: Fn(Connection, RoomName, MessagePayload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = PayloadResult> + Send + 'static,
{
    Arc::new(
        move |connection: Connection,
              room: RoomName,
              payload: MessagePayload|
              -> BoxFuture<'static, PayloadResult> {
            Box::pin(handler(connection, room, payload))
        },
    )
}

fn membership_handler<F, Fut>(handler: F) -> MembershipHandler
where
    F: Fn(Connection, RoomName) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ChatRoomError>> + Send + 'static,
{
    Arc::new(
        move |connection: Connection,
              room: RoomName|
              -> BoxFuture<'static, Result<(), ChatRoomError>> {
            Box::pin(handler(connection, room))
        },
    )
}

/// ミドルウェアレジストリ
#[derive(Debug)]
pub struct MiddlewareRegistry {
    entries: HashMap<String, MiddlewareEntry>,
    order: Vec<String>,
    default_priority: i64,
}

impl MiddlewareRegistry {
    pub fn new(default_priority: i64) -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
            default_priority,
        }
    }

    /// 名前で登録（後勝ち）し、実行順を並べ直す
    pub fn register(&mut self, mut entry: MiddlewareEntry) -> Result<(), ChatRoomError> {
        if entry.name.is_empty() {
            return Err(ChatRoomError::MiddlewareNameRequired);
        }
        if entry.priority.is_none_or(|priority| priority == 0) {
            entry.priority = Some(self.default_priority);
        }

        if !self.entries.contains_key(&entry.name) {
            self.order.push(entry.name.clone());
        }
        tracing::debug!(
            "Registered chat middleware '{}' (priority {:?})",
            entry.name,
            entry.priority
        );
        self.entries.insert(entry.name.clone(), entry);

        let entries = &self.entries;
        let default_priority = self.default_priority;
        self.order.sort_by_key(|name| {
            entries
                .get(name)
                .and_then(|entry| entry.priority)
                .unwrap_or(default_priority)
        });

        Ok(())
    }

    /// 実行順のミドルウェア名
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn get(&self, name: &str) -> Option<&MiddlewareEntry> {
        self.entries.get(name)
    }

    /// `direction` のハンドラ（実行順）
    pub fn handlers(&self, direction: MiddlewareDirection) -> Vec<(String, MiddlewareHandler)> {
        self.order
            .iter()
            .filter_map(|name| {
                let handler = self.entries.get(name)?.handler(direction)?;
                Some((name.clone(), handler))
            })
            .collect()
    }
}
