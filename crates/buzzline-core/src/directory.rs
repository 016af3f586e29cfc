//! Room Directory.
//!
//! Owns the mapping from room code to room record: creation with a unique
//! code, lookups, listing, and the two round-state update paths (the buzz
//! compare-and-set and the unconditional host reset).
//!
//! Code allocation is the classic birthday-collision retry pattern: draw a
//! random code, attempt the insert, and retry when the storage layer's
//! uniqueness constraint rejects it. While occupancy is low this retries
//! O(1) times; the loop is bounded so a pathologically full code space
//! becomes an error instead of a spin. The same loop also absorbs the
//! vanishingly rare id collision.

use serde::Serialize;

use crate::{
    env::Environment,
    error::CoordinatorError,
    model::{Room, RoomCode},
    storage::{Storage, StorageError},
};

/// Attempts before `create_room` gives up on finding an unused code.
const CODE_RETRY_LIMIT: usize = 64;

/// A room annotated with its current player count, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSummary {
    /// The room record.
    #[serde(flatten)]
    pub room: Room,
    /// Number of players currently joined.
    pub player_count: usize,
}

/// Directory of all existing rooms.
#[derive(Clone)]
pub struct RoomDirectory<S> {
    storage: S,
}

impl<S: Storage> RoomDirectory<S> {
    /// Create a directory over the given storage.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Create a room with a freshly generated unique code.
    ///
    /// The new room starts inactive and unlocked; the creating connection
    /// becomes its host.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::CodeSpaceExhausted`] after
    /// `CODE_RETRY_LIMIT` collisions, or a storage error.
    pub fn create_room(
        &self,
        host_connection_id: u64,
        host_user_id: u64,
        env: &impl Environment,
    ) -> Result<Room, CoordinatorError> {
        for attempt in 0..CODE_RETRY_LIMIT {
            let room = Room {
                id: env.random_u128(),
                code: RoomCode::generate(env),
                host_connection_id,
                host_user_id,
                is_active: false,
                buzz_locked: false,
                buzzed_player_name: None,
                created_at_secs: env.wall_clock_secs(),
            };

            match self.storage.insert_room(&room) {
                Ok(()) => {
                    let room_hex = format!("{:032x}", room.id);
                    tracing::info!(room_id = %room_hex, code = %room.code, "room created");
                    return Ok(room);
                },
                // Two concurrent creations drew the same code, or the code
                // was already in use: retry with a fresh draw.
                Err(StorageError::CodeTaken(code)) => {
                    tracing::debug!(%code, attempt, "room code collision, retrying");
                },
                Err(StorageError::RoomExists(_)) => {},
                Err(e) => return Err(e.into()),
            }
        }

        Err(CoordinatorError::CodeSpaceExhausted)
    }

    /// Look up a room by its join code. `Ok(None)` if no room matches.
    pub fn find_by_code(&self, code: &RoomCode) -> Result<Option<Room>, StorageError> {
        self.storage.room_by_code(code)
    }

    /// Look up a room by id. `Ok(None)` if absent.
    pub fn find_by_id(&self, room_id: u128) -> Result<Option<Room>, StorageError> {
        self.storage.room(room_id)
    }

    /// All rooms with their player counts, newest first.
    pub fn list_all(&self) -> Result<Vec<RoomSummary>, StorageError> {
        let mut summaries = Vec::new();
        for room in self.storage.list_rooms()? {
            let player_count = self.storage.count_players(room.id)?;
            summaries.push(RoomSummary { room, player_count });
        }

        summaries.sort_unstable_by(|a, b| {
            b.room
                .created_at_secs
                .cmp(&a.room.created_at_secs)
                .then_with(|| a.room.id.cmp(&b.room.id))
        });

        Ok(summaries)
    }

    /// Conditional buzz-lock transition; see
    /// [`Storage::update_buzz_state`] for the compare-and-set contract.
    pub fn update_buzz_state(
        &self,
        room_id: u128,
        expect_locked: bool,
        locked: bool,
        name: Option<String>,
    ) -> Result<Room, StorageError> {
        self.storage.update_buzz_state(room_id, expect_locked, locked, name)
    }

    /// Unconditional round-control overwrite, used for host resets.
    pub fn update_round_control(
        &self,
        room_id: u128,
        is_active: bool,
        locked: bool,
        name: Option<String>,
    ) -> Result<Room, StorageError> {
        self.storage.update_round_control(room_id, is_active, locked, name)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
    };

    use super::*;
    use crate::{
        model::{CODE_ALPHABET, CODE_LEN},
        storage::MemoryStorage,
    };

    /// Test environment that serves scripted bytes first, then a counter
    /// sequence. Lets tests force specific code draws.
    #[derive(Clone)]
    struct ScriptedEnv {
        scripted: Arc<Mutex<VecDeque<u8>>>,
        counter: Arc<Mutex<u8>>,
    }

    impl ScriptedEnv {
        fn new(scripted: Vec<u8>) -> Self {
            Self {
                scripted: Arc::new(Mutex::new(scripted.into())),
                counter: Arc::new(Mutex::new(0)),
            }
        }
    }

    impl Environment for ScriptedEnv {
        fn wall_clock_secs(&self) -> u64 {
            1_000
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            let mut scripted = self.scripted.lock().unwrap();
            let mut counter = self.counter.lock().unwrap();
            for slot in buffer.iter_mut() {
                *slot = scripted.pop_front().unwrap_or_else(|| {
                    *counter = counter.wrapping_add(1);
                    *counter
                });
            }
        }
    }

    #[test]
    fn create_room_starts_inactive_and_unlocked() {
        let directory = RoomDirectory::new(MemoryStorage::new());
        let env = ScriptedEnv::new(vec![]);

        let room = directory.create_room(11, 101, &env).unwrap();

        assert!(!room.is_active);
        assert!(!room.buzz_locked);
        assert_eq!(room.buzzed_player_name, None);
        assert_eq!(room.host_connection_id, 11);
        assert_eq!(room.host_user_id, 101);
        assert_eq!(room.code.as_str().len(), CODE_LEN);
    }

    #[test]
    fn create_room_retries_on_code_collision() {
        let storage = MemoryStorage::new();
        let directory = RoomDirectory::new(storage.clone());

        // First creation consumes 16 scripted zero bytes for the id, then
        // 6 for the code (all map to 'A').
        let env = ScriptedEnv::new(vec![0; 22]);
        let first = directory.create_room(1, 10, &env).unwrap();
        assert_eq!(first.code.as_str(), "AAAAAA");

        // Second creation draws the same code first (16 scripted id bytes,
        // then 6 zero code bytes), collides, and must retry with a fresh
        // draw rather than fail.
        let env = ScriptedEnv::new([vec![1u8; 16], vec![0u8; 6]].concat());
        let second = directory.create_room(2, 20, &env).unwrap();

        assert_ne!(second.code, first.code);
        assert_eq!(storage.room_count(), 2);
    }

    #[test]
    fn find_by_code_misses_are_ordinary() {
        let directory = RoomDirectory::new(MemoryStorage::new());
        let missing = directory.find_by_code(&RoomCode::parse("ZZZZZZ").unwrap()).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn list_all_orders_newest_first_with_counts() {
        #[derive(Clone)]
        struct ClockEnv {
            now: Arc<Mutex<u64>>,
            counter: Arc<Mutex<u8>>,
        }

        impl Environment for ClockEnv {
            fn wall_clock_secs(&self) -> u64 {
                let mut now = self.now.lock().unwrap();
                *now += 10;
                *now
            }

            fn random_bytes(&self, buffer: &mut [u8]) {
                let mut counter = self.counter.lock().unwrap();
                for slot in buffer.iter_mut() {
                    *counter = counter.wrapping_add(1);
                    *slot = *counter;
                }
            }
        }

        let storage = MemoryStorage::new();
        let directory = RoomDirectory::new(storage.clone());
        let env =
            ClockEnv { now: Arc::new(Mutex::new(0)), counter: Arc::new(Mutex::new(0)) };

        let older = directory.create_room(1, 10, &env).unwrap();
        let newer = directory.create_room(2, 20, &env).unwrap();

        storage
            .insert_player(&crate::model::Player {
                id: 7,
                connection_id: 70,
                name: "Ada".to_string(),
                user_id: 700,
                room_id: older.id,
            })
            .unwrap();

        let listing = directory.list_all().unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].room.id, newer.id);
        assert_eq!(listing[0].player_count, 0);
        assert_eq!(listing[1].room.id, older.id);
        assert_eq!(listing[1].player_count, 1);
    }

    #[test]
    fn generated_codes_use_the_alphabet() {
        let directory = RoomDirectory::new(MemoryStorage::new());
        let env = ScriptedEnv::new(vec![]);

        for _ in 0..20 {
            let room = directory.create_room(1, 1, &env).unwrap();
            for c in room.code.as_str().chars() {
                assert!(CODE_ALPHABET.contains(&(c as u8)));
            }
        }
    }
}
