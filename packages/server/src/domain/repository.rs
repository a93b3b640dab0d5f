//! Repository trait 定義
//!
//! Room の存在と Room ごとのメンバーを記録する共有ストアへのインターフェース。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! すべての操作は冪等なプリミティブ（集合への追加・削除、ハッシュのフィールド設定・削除）で、
//! 複数の呼び出しをまたぐトランザクションは提供しない。

use std::collections::HashMap;

use async_trait::async_trait;

use super::{ConnectionId, Member, RoomName, StoreError};

/// Membership Store trait
///
/// クラスタ全体で共有される Room / メンバー情報のストア。
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// 登録済みの Room 名を取得
    async fn list_rooms(&self) -> Result<Vec<RoomName>, StoreError>;

    /// Room が存在するか
    async fn room_exists(&self, room: &RoomName) -> Result<bool, StoreError>;

    /// Room を追加（既に存在する場合は `false`）
    async fn add_room(&self, room: &RoomName) -> Result<bool, StoreError>;

    /// Room を削除（メンバー情報は削除しない）
    async fn remove_room(&self, room: &RoomName) -> Result<(), StoreError>;

    /// メンバーレコードを書き込む
    async fn set_member(&self, room: &RoomName, member: &Member) -> Result<(), StoreError>;

    /// メンバーレコードを削除
    async fn remove_member(&self, room: &RoomName, id: &ConnectionId) -> Result<(), StoreError>;

    /// Room の全メンバーレコードを取得
    async fn members(&self, room: &RoomName)
    -> Result<HashMap<ConnectionId, Member>, StoreError>;

    /// Room のメンバー情報をまとめて削除
    async fn delete_members(&self, room: &RoomName) -> Result<(), StoreError>;
}
