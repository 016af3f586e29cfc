//! Chaotic storage wrapper for fault injection testing.
//!
//! Storage wrapper that randomly fails operations to verify the engine
//! isolates storage failures to the single event being processed. Not for
//! production use.

use std::sync::{Arc, Mutex};

use super::{Storage, StorageError};
use crate::model::{Player, Room, RoomCode};

/// Chaotic storage wrapper that randomly injects failures.
///
/// Delegates to an underlying storage implementation but fails operations
/// with a configured probability, surfacing `StorageError::Io`. Uses
/// `Arc<Mutex<>>` for the RNG state, making it Clone and thread-safe.
#[derive(Clone)]
pub struct ChaoticStorage<S: Storage> {
    inner: S,
    /// Failure rate (0.0 = never fail, 1.0 = always fail)
    failure_rate: f64,
    /// RNG state for deterministic chaos
    rng: Arc<Mutex<ChaoticRng>>,
    /// Operation counter, for asserting how much work an event performed
    operation_count: Arc<Mutex<usize>>,
}

/// Simple deterministic RNG for chaos injection.
///
/// Linear congruential generator, so chaos runs are reproducible with the
/// same seed.
struct ChaoticRng {
    state: u64,
}

impl ChaoticRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next random value in [0.0, 1.0)
    fn next(&mut self) -> f64 {
        // LCG constants from Numerical Recipes
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        (self.state as f64) / (M as f64)
    }

    fn should_fail(&mut self, failure_rate: f64) -> bool {
        self.next() < failure_rate
    }
}

impl<S: Storage> ChaoticStorage<S> {
    /// Create a new chaotic storage wrapper with a fixed default seed.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0].
    pub fn new(inner: S, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, 0x1234_5678_9ABC_DEF0)
    }

    /// Create with an explicit seed for reproducible chaos.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0].
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );

        Self {
            inner,
            failure_rate,
            rng: Arc::new(Mutex::new(ChaoticRng::new(seed))),
            operation_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Underlying storage, for checking invariants after chaos.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Total number of storage operations attempted (including failed ones).
    pub fn operation_count(&self) -> usize {
        #[allow(clippy::expect_used)]
        *self.operation_count.lock().expect("operation_count mutex poisoned")
    }

    fn observe(&self) -> Result<(), StorageError> {
        #[allow(clippy::expect_used)]
        {
            *self.operation_count.lock().expect("operation_count mutex poisoned") += 1;
        }

        #[allow(clippy::expect_used)]
        let fail =
            self.rng.lock().expect("ChaoticRng mutex poisoned").should_fail(self.failure_rate);

        if fail {
            return Err(StorageError::Io("injected storage failure".to_string()));
        }

        Ok(())
    }
}

impl<S: Storage> Storage for ChaoticStorage<S> {
    fn insert_room(&self, room: &Room) -> Result<(), StorageError> {
        self.observe()?;
        self.inner.insert_room(room)
    }

    fn room_by_code(&self, code: &RoomCode) -> Result<Option<Room>, StorageError> {
        self.observe()?;
        self.inner.room_by_code(code)
    }

    fn room(&self, room_id: u128) -> Result<Option<Room>, StorageError> {
        self.observe()?;
        self.inner.room(room_id)
    }

    fn list_rooms(&self) -> Result<Vec<Room>, StorageError> {
        self.observe()?;
        self.inner.list_rooms()
    }

    fn update_buzz_state(
        &self,
        room_id: u128,
        expect_locked: bool,
        locked: bool,
        name: Option<String>,
    ) -> Result<Room, StorageError> {
        self.observe()?;
        self.inner.update_buzz_state(room_id, expect_locked, locked, name)
    }

    fn update_round_control(
        &self,
        room_id: u128,
        is_active: bool,
        locked: bool,
        name: Option<String>,
    ) -> Result<Room, StorageError> {
        self.observe()?;
        self.inner.update_round_control(room_id, is_active, locked, name)
    }

    fn insert_player(&self, player: &Player) -> Result<(), StorageError> {
        self.observe()?;
        self.inner.insert_player(player)
    }

    fn player(&self, player_id: u64) -> Result<Option<Player>, StorageError> {
        self.observe()?;
        self.inner.player(player_id)
    }

    fn player_by_connection(&self, connection_id: u64) -> Result<Option<Player>, StorageError> {
        self.observe()?;
        self.inner.player_by_connection(connection_id)
    }

    fn bind_connection(&self, connection_id: u64, player_id: u64) -> Result<(), StorageError> {
        self.observe()?;
        self.inner.bind_connection(connection_id, player_id)
    }

    fn unbind_connection(&self, connection_id: u64) -> Result<(), StorageError> {
        self.observe()?;
        self.inner.unbind_connection(connection_id)
    }

    fn delete_player(&self, player_id: u64) -> Result<Player, StorageError> {
        self.observe()?;
        self.inner.delete_player(player_id)
    }

    fn count_players(&self, room_id: u128) -> Result<usize, StorageError> {
        self.observe()?;
        self.inner.count_players(room_id)
    }

    fn players_in_room(&self, room_id: u128) -> Result<Vec<Player>, StorageError> {
        self.observe()?;
        self.inner.players_in_room(room_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn room(id: u128, code: &str) -> Room {
        Room {
            id,
            code: RoomCode::parse(code).unwrap(),
            host_connection_id: 1,
            host_user_id: 100,
            is_active: false,
            buzz_locked: false,
            buzzed_player_name: None,
            created_at_secs: 0,
        }
    }

    #[test]
    fn zero_failure_rate_delegates_everything() {
        let storage = ChaoticStorage::new(MemoryStorage::new(), 0.0);

        storage.insert_room(&room(1, "AAAAAA")).unwrap();
        assert!(storage.room(1).unwrap().is_some());
        assert_eq!(storage.operation_count(), 2);
    }

    #[test]
    fn full_failure_rate_fails_everything() {
        let storage = ChaoticStorage::new(MemoryStorage::new(), 1.0);

        let result = storage.insert_room(&room(1, "AAAAAA"));
        assert!(matches!(result, Err(StorageError::Io(_))));

        // Nothing reached the underlying store.
        assert_eq!(storage.inner().room_count(), 0);
    }

    #[test]
    fn same_seed_same_chaos() {
        let run = |seed: u64| -> Vec<bool> {
            let storage = ChaoticStorage::with_seed(MemoryStorage::new(), 0.5, seed);
            (0..32u32).map(|i| storage.room(u128::from(i)).is_ok()).collect()
        };

        assert_eq!(run(42), run(42));
        assert_ne!(run(42), run(43));
    }

    #[test]
    #[should_panic(expected = "failure_rate must be between")]
    fn out_of_range_failure_rate_panics() {
        let _ = ChaoticStorage::new(MemoryStorage::new(), 1.5);
    }
}
