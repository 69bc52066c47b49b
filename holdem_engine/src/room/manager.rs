//! Registry of open rooms.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, RwLock};

use crate::game::{Game, entities::RoomId, entities::Username};

/// Exclusive access to one room's game. Holding the lock serializes
/// every request for the room, persistence included.
pub type RoomHandle = Arc<Mutex<Game>>;

/// Room metadata for discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomMetadata {
    pub room_id: RoomId,
    pub host_name: Username,
    pub player_count: usize,
    pub room_limit: usize,
    pub is_started: bool,
}

/// Registry mapping room ids to their handles. Cloning shares the
/// registry.
#[derive(Clone, Default)]
pub struct RoomManager {
    rooms: Arc<RwLock<HashMap<RoomId, RoomHandle>>>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a room, keeping the existing handle if the room is
    /// already registered.
    pub async fn insert(&self, game: Game) -> RoomHandle {
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(game.room_id)
            .or_insert_with(|| Arc::new(Mutex::new(game)))
            .clone()
    }

    pub async fn get(&self, room_id: RoomId) -> Option<RoomHandle> {
        let rooms = self.rooms.read().await;
        rooms.get(&room_id).cloned()
    }

    pub async fn remove(&self, room_id: RoomId) -> Option<RoomHandle> {
        let mut rooms = self.rooms.write().await;
        rooms.remove(&room_id)
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }

    /// Metadata for every open room.
    ///
    /// Rooms are locked one at a time, so a room busy with a request
    /// delays the listing but never blocks other rooms.
    pub async fn list_rooms(&self) -> Vec<RoomMetadata> {
        let handles: Vec<RoomHandle> = self.rooms.read().await.values().cloned().collect();
        let mut metadata = Vec::with_capacity(handles.len());
        for handle in handles {
            let game = handle.lock().await;
            metadata.push(RoomMetadata {
                room_id: game.room_id,
                host_name: game.host_name.clone(),
                player_count: game.players.len(),
                room_limit: game.room_limit,
                is_started: game.is_started,
            });
        }
        metadata
    }
}
