//! ドメイン層
//!
//! 値オブジェクト、エンティティ、エラー、ミドルウェア、およびユースケースが依存する
//! 外部との境界の trait（ストア、メッセージバス、クラスタ転送、接続管理）。

pub mod cluster;
pub mod connection;
pub mod entity;
pub mod error;
pub mod message_bus;
pub mod middleware;
pub mod repository;
pub mod value_object;

pub use cluster::{
    ADD_MEMBER_METHOD, ClusterCall, ClusterDispatcher, ClusterNode, ClusterOperation,
    DISMISS_MEMBER_METHOD, REMOVE_MEMBER_METHOD,
};
pub use connection::{ConnectionHub, PusherChannel};
pub use entity::{
    CHAT_MESSAGE_TYPE, ChatEnvelope, Connection, EnvelopeConnection, Member, MemberDetails,
    MessagePayload, ROOM_DELETED_NOTICE, RoomStatus, USER_CONTEXT,
};
pub use error::{BusError, ChatRoomError, DeliveryError, DispatchError, StoreError};
pub use message_bus::MessageBus;
pub use middleware::{
    MembershipHandler, MiddlewareDirection, MiddlewareEntry, MiddlewareHandler,
    MiddlewareRegistry, PayloadHandler, PayloadResult,
};
pub use repository::MembershipStore;
pub use value_object::{ConnectionId, NodeId, RoomName, SYSTEM_CONNECTION_ID, ValueObjectError};
