//! InMemory Membership Store 実装
//!
//! ドメイン層が定義する `MembershipStore` trait の具体的な実装。
//! 共有 KV ストアと同じレイアウトで保持します：
//!
//! ```text
//! <keys.rooms>                 : Set<RoomName>
//! <keys.members_prefix><room>  : Hash<ConnectionId, Member(JSON)>
//! ```
//!
//! 1 つのインスタンスを `Arc` で複数の Engine に渡すと、クラスタ共有ストアとして振る舞う。

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    config::StoreKeys,
    domain::{ConnectionId, Member, MembershipStore, RoomName, StoreError},
};

#[derive(Default)]
struct KeySpace {
    sets: HashMap<String, BTreeSet<String>>,
    hashes: HashMap<String, HashMap<String, String>>,
}

/// インメモリ Membership Store 実装
pub struct InMemoryMembershipStore {
    keys: StoreKeys,
    data: Mutex<KeySpace>,
}

impl InMemoryMembershipStore {
    pub fn new(keys: StoreKeys) -> Self {
        Self {
            keys,
            data: Mutex::new(KeySpace::default()),
        }
    }
}

impl Default for InMemoryMembershipStore {
    fn default() -> Self {
        Self::new(StoreKeys::default())
    }
}

#[async_trait]
impl MembershipStore for InMemoryMembershipStore {
    async fn list_rooms(&self) -> Result<Vec<RoomName>, StoreError> {
        let data = self.data.lock().await;
        let Some(rooms) = data.sets.get(&self.keys.rooms) else {
            return Ok(Vec::new());
        };
        rooms
            .iter()
            .map(|room| {
                RoomName::new(room.as_str()).map_err(|e| StoreError::CorruptedRecord {
                    key: self.keys.rooms.clone(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    async fn room_exists(&self, room: &RoomName) -> Result<bool, StoreError> {
        let data = self.data.lock().await;
        Ok(data
            .sets
            .get(&self.keys.rooms)
            .is_some_and(|rooms| rooms.contains(room.as_str())))
    }

    async fn add_room(&self, room: &RoomName) -> Result<bool, StoreError> {
        let mut data = self.data.lock().await;
        Ok(data
            .sets
            .entry(self.keys.rooms.clone())
            .or_default()
            .insert(room.to_string()))
    }

    async fn remove_room(&self, room: &RoomName) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        if let Some(rooms) = data.sets.get_mut(&self.keys.rooms) {
            rooms.remove(room.as_str());
        }
        Ok(())
    }

    async fn set_member(&self, room: &RoomName, member: &Member) -> Result<(), StoreError> {
        let key = self.keys.members_key(room);
        let record = serde_json::to_string(member).map_err(|e| StoreError::CorruptedRecord {
            key: key.clone(),
            reason: e.to_string(),
        })?;

        let mut data = self.data.lock().await;
        data.hashes
            .entry(key)
            .or_default()
            .insert(member.id.to_string(), record);
        Ok(())
    }

    async fn remove_member(&self, room: &RoomName, id: &ConnectionId) -> Result<(), StoreError> {
        let key = self.keys.members_key(room);
        let mut data = self.data.lock().await;
        if let Some(members) = data.hashes.get_mut(&key) {
            members.remove(id.as_str());
            if members.is_empty() {
                data.hashes.remove(&key);
            }
        }
        Ok(())
    }

    async fn members(
        &self,
        room: &RoomName,
    ) -> Result<HashMap<ConnectionId, Member>, StoreError> {
        let key = self.keys.members_key(room);
        let data = self.data.lock().await;
        let Some(records) = data.hashes.get(&key) else {
            return Ok(HashMap::new());
        };

        records
            .values()
            .map(|record| -> Result<(ConnectionId, Member), StoreError> {
                let member: Member =
                    serde_json::from_str(record).map_err(|e| StoreError::CorruptedRecord {
                        key: key.clone(),
                        reason: e.to_string(),
                    })?;
                Ok((member.id.clone(), member))
            })
            .collect()
    }

    async fn delete_members(&self, room: &RoomName) -> Result<(), StoreError> {
        let key = self.keys.members_key(room);
        self.data.lock().await.hashes.remove(&key);
        Ok(())
    }
}
