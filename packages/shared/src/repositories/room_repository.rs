use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::models::game_room::{GameRoom, RoomKind};
use crate::repositories::errors::room_repository_errors::RoomRepositoryError;

/// A room behind its own lock. Rooms never share a lock with each other.
pub type SharedRoom = Arc<Mutex<GameRoom>>;

/// Registry mapping game ids to live rooms.
///
/// Lock order is registry first, then room. Callers holding a room lock must
/// not call back into the registry.
#[async_trait]
pub trait GameRoomRepository: Send + Sync {
    /// Registers a room ahead of any connection, e.g. for a fresh pairing.
    async fn open_room(
        &self,
        game_id: &str,
        kind: RoomKind,
        participants: Option<[String; 2]>,
    ) -> Result<SharedRoom, RoomRepositoryError>;

    async fn get_or_create_room(&self, game_id: &str) -> SharedRoom;

    async fn get_room(&self, game_id: &str) -> Option<SharedRoom>;

    /// Drops the room when nobody is connected and no result is owed. The room
    /// is marked closed so late attach attempts go back to the registry.
    async fn remove_room_if_empty(&self, game_id: &str) -> bool;

    async fn room_count(&self) -> usize;
}

#[derive(Default)]
pub struct InMemoryGameRoomRepository {
    rooms: RwLock<HashMap<String, SharedRoom>>,
}

impl InMemoryGameRoomRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameRoomRepository for InMemoryGameRoomRepository {
    async fn open_room(
        &self,
        game_id: &str,
        kind: RoomKind,
        participants: Option<[String; 2]>,
    ) -> Result<SharedRoom, RoomRepositoryError> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(game_id) {
            return Err(RoomRepositoryError::AlreadyExists(game_id.to_string()));
        }

        let room = Arc::new(Mutex::new(GameRoom::new(game_id, kind, participants)));
        rooms.insert(game_id.to_string(), room.clone());
        debug!("Opened game room {}", game_id);
        Ok(room)
    }

    async fn get_or_create_room(&self, game_id: &str) -> SharedRoom {
        if let Some(room) = self.rooms.read().await.get(game_id) {
            return room.clone();
        }

        let mut rooms = self.rooms.write().await;
        rooms
            .entry(game_id.to_string())
            .or_insert_with(|| {
                debug!("Creating game room {} on first connect", game_id);
                Arc::new(Mutex::new(GameRoom::open(game_id)))
            })
            .clone()
    }

    async fn get_room(&self, game_id: &str) -> Option<SharedRoom> {
        self.rooms.read().await.get(game_id).cloned()
    }

    async fn remove_room_if_empty(&self, game_id: &str) -> bool {
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get(game_id).cloned() else {
            return false;
        };

        let mut room = room.lock().await;
        if !room.is_empty() || room.result_pending() {
            return false;
        }
        room.close();
        rooms.remove(game_id);
        debug!("Removed game room {}", game_id);
        true
    }

    async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}
