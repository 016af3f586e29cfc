use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use super::{Storage, StorageError};
use crate::model::{Player, Room, RoomCode};

/// In-memory storage implementation.
///
/// Uses `HashMap`s guarded by a single mutex, which trivially satisfies the
/// contract's atomicity requirements: the code-uniqueness check in
/// `insert_room` and the compare-and-set in `update_buzz_state` each run
/// under the lock. All state is wrapped in `Arc<Mutex<>>` so clones access
/// the same store. Uses `lock().expect()` which will panic if the mutex is
/// poisoned — acceptable for a non-durable backend.
#[derive(Clone)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryStorageInner>>,
}

struct MemoryStorageInner {
    /// Room id → room record
    rooms: HashMap<u128, Room>,

    /// Room code → room id (uniqueness index)
    code_index: HashMap<RoomCode, u128>,

    /// Player id → player record
    players: HashMap<u64, Player>,

    /// Connection id → player id (at most one player per connection)
    by_connection: HashMap<u64, u64>,
}

impl MemoryStorage {
    /// Create a new empty `MemoryStorage`.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryStorageInner {
                rooms: HashMap::new(),
                code_index: HashMap::new(),
                players: HashMap::new(),
                by_connection: HashMap::new(),
            })),
        }
    }

    /// Number of rooms currently stored. Useful for tests.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[allow(clippy::expect_used)]
    pub fn room_count(&self) -> usize {
        self.inner.lock().expect("Mutex poisoned").rooms.len()
    }

    /// Total number of players across all rooms. Useful for tests.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[allow(clippy::expect_used)]
    pub fn player_count(&self) -> usize {
        self.inner.lock().expect("Mutex poisoned").players.len()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::expect_used, reason = "Mutex poisoning is unrecoverable here")]
impl Storage for MemoryStorage {
    fn insert_room(&self, room: &Room) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");

        if inner.rooms.contains_key(&room.id) {
            return Err(StorageError::RoomExists(room.id));
        }
        if inner.code_index.contains_key(&room.code) {
            return Err(StorageError::CodeTaken(room.code.clone()));
        }

        debug_assert!(room.buzz_state_consistent());

        inner.code_index.insert(room.code.clone(), room.id);
        inner.rooms.insert(room.id, room.clone());

        Ok(())
    }

    fn room_by_code(&self, code: &RoomCode) -> Result<Option<Room>, StorageError> {
        let inner = self.inner.lock().expect("Mutex poisoned");

        Ok(inner.code_index.get(code).and_then(|id| inner.rooms.get(id)).cloned())
    }

    fn room(&self, room_id: u128) -> Result<Option<Room>, StorageError> {
        let inner = self.inner.lock().expect("Mutex poisoned");

        Ok(inner.rooms.get(&room_id).cloned())
    }

    fn list_rooms(&self) -> Result<Vec<Room>, StorageError> {
        let inner = self.inner.lock().expect("Mutex poisoned");

        Ok(inner.rooms.values().cloned().collect())
    }

    fn update_buzz_state(
        &self,
        room_id: u128,
        expect_locked: bool,
        locked: bool,
        name: Option<String>,
    ) -> Result<Room, StorageError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");

        let room = inner.rooms.get_mut(&room_id).ok_or(StorageError::RoomNotFound(room_id))?;

        if room.buzz_locked != expect_locked {
            return Err(StorageError::LockConflict {
                expected: expect_locked,
                found: room.buzz_locked,
            });
        }

        room.buzz_locked = locked;
        room.buzzed_player_name = name;

        debug_assert!(room.buzz_state_consistent());

        Ok(room.clone())
    }

    fn update_round_control(
        &self,
        room_id: u128,
        is_active: bool,
        locked: bool,
        name: Option<String>,
    ) -> Result<Room, StorageError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");

        let room = inner.rooms.get_mut(&room_id).ok_or(StorageError::RoomNotFound(room_id))?;

        room.is_active = is_active;
        room.buzz_locked = locked;
        room.buzzed_player_name = name;

        debug_assert!(room.buzz_state_consistent());

        Ok(room.clone())
    }

    fn insert_player(&self, player: &Player) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");

        debug_assert!(!inner.players.contains_key(&player.id));

        inner.by_connection.insert(player.connection_id, player.id);
        inner.players.insert(player.id, player.clone());

        Ok(())
    }

    fn player(&self, player_id: u64) -> Result<Option<Player>, StorageError> {
        let inner = self.inner.lock().expect("Mutex poisoned");

        Ok(inner.players.get(&player_id).cloned())
    }

    fn player_by_connection(&self, connection_id: u64) -> Result<Option<Player>, StorageError> {
        let inner = self.inner.lock().expect("Mutex poisoned");

        Ok(inner.by_connection.get(&connection_id).and_then(|id| inner.players.get(id)).cloned())
    }

    fn bind_connection(&self, connection_id: u64, player_id: u64) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");

        let previous = match inner.players.get_mut(&player_id) {
            Some(player) => {
                let previous = player.connection_id;
                player.connection_id = connection_id;
                previous
            },
            None => return Err(StorageError::PlayerNotFound(player_id)),
        };

        if previous != connection_id {
            inner.by_connection.remove(&previous);
        }
        inner.by_connection.insert(connection_id, player_id);

        Ok(())
    }

    fn unbind_connection(&self, connection_id: u64) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");

        inner.by_connection.remove(&connection_id);

        Ok(())
    }

    fn delete_player(&self, player_id: u64) -> Result<Player, StorageError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");

        let player =
            inner.players.remove(&player_id).ok_or(StorageError::PlayerNotFound(player_id))?;

        // Only drop the index entry if it still points at this player; the
        // connection may have been rebound since.
        if inner.by_connection.get(&player.connection_id) == Some(&player_id) {
            inner.by_connection.remove(&player.connection_id);
        }

        Ok(player)
    }

    fn count_players(&self, room_id: u128) -> Result<usize, StorageError> {
        let inner = self.inner.lock().expect("Mutex poisoned");

        Ok(inner.players.values().filter(|p| p.room_id == room_id).count())
    }

    fn players_in_room(&self, room_id: u128) -> Result<Vec<Player>, StorageError> {
        let inner = self.inner.lock().expect("Mutex poisoned");

        Ok(inner.players.values().filter(|p| p.room_id == room_id).cloned().collect())
    }
}
