//! Connection Registry.
//!
//! Maps an active connection identifier to the player record currently
//! associated with it, backed by the same storage as the player records
//! themselves. A lookup miss is a normal (not exceptional) outcome meaning
//! "no player for this connection" — hosts without a player record and
//! already-removed players both land there, and callers treat it as a
//! silent no-op.

use crate::{
    model::Player,
    storage::{Storage, StorageError},
};

/// Registry resolving connections to players.
#[derive(Clone)]
pub struct ConnectionRegistry<S> {
    storage: S,
}

impl<S: Storage> ConnectionRegistry<S> {
    /// Create a registry over the given storage.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Bind a connection to a player, overwriting any previous binding of
    /// either side (reconnect semantics).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::PlayerNotFound` if the player is gone.
    pub fn bind(&self, connection_id: u64, player_id: u64) -> Result<(), StorageError> {
        self.storage.bind_connection(connection_id, player_id)
    }

    /// The player currently bound to this connection, if any.
    pub fn lookup_player_by_connection(
        &self,
        connection_id: u64,
    ) -> Result<Option<Player>, StorageError> {
        self.storage.player_by_connection(connection_id)
    }

    /// Sever a connection's binding; the player record stays.
    pub fn unbind(&self, connection_id: u64) -> Result<(), StorageError> {
        self.storage.unbind_connection(connection_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{Player, Room, RoomCode},
        storage::MemoryStorage,
    };

    fn seeded_storage() -> MemoryStorage {
        let storage = MemoryStorage::new();
        storage
            .insert_room(&Room {
                id: 1,
                code: RoomCode::parse("AAAAAA").unwrap(),
                host_connection_id: 1,
                host_user_id: 10,
                is_active: false,
                buzz_locked: false,
                buzzed_player_name: None,
                created_at_secs: 0,
            })
            .unwrap();
        storage
            .insert_player(&Player {
                id: 7,
                connection_id: 70,
                name: "Ada".to_string(),
                user_id: 700,
                room_id: 1,
            })
            .unwrap();
        storage
    }

    #[test]
    fn lookup_resolves_bound_connection() {
        let registry = ConnectionRegistry::new(seeded_storage());

        let player = registry.lookup_player_by_connection(70).unwrap().unwrap();
        assert_eq!(player.name, "Ada");
    }

    #[test]
    fn lookup_miss_is_ordinary() {
        let registry = ConnectionRegistry::new(seeded_storage());
        assert!(registry.lookup_player_by_connection(999).unwrap().is_none());
    }

    #[test]
    fn rebind_moves_the_connection() {
        let registry = ConnectionRegistry::new(seeded_storage());

        registry.bind(71, 7).unwrap();

        assert!(registry.lookup_player_by_connection(70).unwrap().is_none());
        let player = registry.lookup_player_by_connection(71).unwrap().unwrap();
        assert_eq!(player.id, 7);
    }

    #[test]
    fn bind_to_missing_player_fails() {
        let registry = ConnectionRegistry::new(seeded_storage());
        assert_eq!(registry.bind(70, 404), Err(StorageError::PlayerNotFound(404)));
    }

    #[test]
    fn unbind_severs_only_the_mapping() {
        let storage = seeded_storage();
        let registry = ConnectionRegistry::new(storage.clone());

        registry.unbind(70).unwrap();

        assert!(registry.lookup_player_by_connection(70).unwrap().is_none());
        assert!(storage.player(7).unwrap().is_some());
    }
}
