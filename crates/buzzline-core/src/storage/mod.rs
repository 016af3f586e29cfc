//! Storage abstraction for rooms and players.
//!
//! Trait-based abstraction over the persistent store. The trait is
//! synchronous (no async) to keep the engine Sans-IO; implementations own
//! their concurrency. Two properties of the contract carry the whole
//! correctness story of the engine:
//!
//! 1. `insert_room` enforces uniqueness of room codes, so concurrent
//!    creations that draw the same code resolve by one caller retrying.
//! 2. `update_buzz_state` is a compare-and-set on `buzz_locked`, so of any
//!    number of concurrent buzz attempts exactly one observes success.
//!
//! Everything else is ordinary CRUD.

mod chaotic;
mod error;
mod memory;

pub use chaotic::ChaoticStorage;
pub use error::StorageError;
pub use memory::MemoryStorage;

use crate::model::{Player, Room, RoomCode};

/// Storage abstraction for room and player records.
///
/// Must be Clone (shared across event handlers), Send + Sync (events run
/// concurrently), and synchronous. Implementations typically share internal
/// state via Arc, so clones access the same underlying store.
///
/// Every individual method call is atomic with respect to every other call;
/// the contract promises nothing across calls except what
/// `update_buzz_state` states explicitly.
pub trait Storage: Clone + Send + Sync + 'static {
    /// Insert a freshly created room.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::CodeTaken` if another room holds the code and
    /// `StorageError::RoomExists` on an id collision. Both are resolved by
    /// the caller retrying with fresh random values.
    fn insert_room(&self, room: &Room) -> Result<(), StorageError>;

    /// Look up a room by its join code. `Ok(None)` if no room matches.
    fn room_by_code(&self, code: &RoomCode) -> Result<Option<Room>, StorageError>;

    /// Look up a room by id. `Ok(None)` if absent.
    fn room(&self, room_id: u128) -> Result<Option<Room>, StorageError>;

    /// All existing rooms, in unspecified order.
    fn list_rooms(&self) -> Result<Vec<Room>, StorageError>;

    /// Conditionally transition a room's buzz-lock state.
    ///
    /// Applies `{buzz_locked: locked, buzzed_player_name: name}` only if the
    /// stored `buzz_locked` equals `expect_locked`, and returns the updated
    /// room.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::LockConflict` when the pre-state does not
    /// match — for a buzz this means another buzz was serialized first.
    /// Returns `StorageError::RoomNotFound` if the room is gone.
    fn update_buzz_state(
        &self,
        room_id: u128,
        expect_locked: bool,
        locked: bool,
        name: Option<String>,
    ) -> Result<Room, StorageError>;

    /// Unconditionally overwrite a room's round-control state.
    ///
    /// Used for host-initiated resets, which are serialized by the host
    /// authority check rather than by compare-and-set.
    fn update_round_control(
        &self,
        room_id: u128,
        is_active: bool,
        locked: bool,
        name: Option<String>,
    ) -> Result<Room, StorageError>;

    /// Insert a joined player and bind its connection.
    fn insert_player(&self, player: &Player) -> Result<(), StorageError>;

    /// Look up a player by id. `Ok(None)` if absent.
    fn player(&self, player_id: u64) -> Result<Option<Player>, StorageError>;

    /// Look up the player currently bound to a connection.
    ///
    /// `Ok(None)` is a normal outcome meaning "no player for this
    /// connection" — used pervasively to detect stale or unauthenticated
    /// events.
    fn player_by_connection(&self, connection_id: u64) -> Result<Option<Player>, StorageError>;

    /// Bind a connection to a player, overwriting any previous binding of
    /// either side (reconnect semantics).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::PlayerNotFound` if the player is gone.
    fn bind_connection(&self, connection_id: u64, player_id: u64) -> Result<(), StorageError>;

    /// Sever a connection's binding without deleting the player record.
    ///
    /// A no-op if the connection was not bound.
    fn unbind_connection(&self, connection_id: u64) -> Result<(), StorageError>;

    /// Delete a player record and its connection binding, returning the
    /// removed record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::PlayerNotFound` if already deleted.
    fn delete_player(&self, player_id: u64) -> Result<Player, StorageError>;

    /// Number of players currently in a room.
    fn count_players(&self, room_id: u128) -> Result<usize, StorageError>;

    /// All players currently in a room, in unspecified order.
    fn players_in_room(&self, room_id: u128) -> Result<Vec<Player>, StorageError>;
}
