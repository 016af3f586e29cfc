//! Buzz Arbiter.
//!
//! Guarantees exactly one winner per round even when buzz events from
//! different players arrive concurrently for the same room.
//!
//! ## Why compare-and-set
//!
//! A plain read-then-write lets two buzzes that interleave between the read
//! and the write both observe an unlocked room and both "win". The arbiter
//! therefore transitions the lock through the storage layer's conditional
//! update: expected pre-state `buzz_locked = false`, target state locked
//! with the winner's name. Of any number of racing attempts, storage
//! serializes exactly one success; every loser gets a conflict and is
//! silently dropped — a lost buzz is a normal outcome, not an error, and is
//! never retried.
//!
//! Which attempt wins is whatever order storage serializes the updates; the
//! arbiter promises "exactly one", not "first by wall clock".

use crate::{
    directory::RoomDirectory,
    error::CoordinatorError,
    model::Room,
    registry::ConnectionRegistry,
    storage::{Storage, StorageError},
};

/// Outcome of a winning buzz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuzzWin {
    /// Room the round belongs to.
    pub room_id: u128,
    /// Display name of the winning player.
    pub winner_name: String,
}

/// First-to-buzz arbitration and round-reset logic.
#[derive(Clone)]
pub struct BuzzArbiter<S> {
    directory: RoomDirectory<S>,
    registry: ConnectionRegistry<S>,
}

impl<S: Storage> BuzzArbiter<S> {
    /// Create an arbiter over the shared storage.
    pub fn new(storage: S) -> Self {
        Self {
            directory: RoomDirectory::new(storage.clone()),
            registry: ConnectionRegistry::new(storage),
        }
    }

    /// Attempt to buzz on behalf of whoever is bound to `connection_id`.
    ///
    /// Returns `Ok(None)` for every losing outcome: unknown connection,
    /// vanished room, inactive round, already-locked round, or losing the
    /// compare-and-set race. None of these mutate state.
    ///
    /// # Errors
    ///
    /// Only genuine storage faults propagate; the caller decides whether to
    /// surface them (the coordinator logs and drops them, so the buzzer
    /// experiences a lost buzz).
    pub fn handle_buzz(&self, connection_id: u64) -> Result<Option<BuzzWin>, StorageError> {
        let Some(player) = self.registry.lookup_player_by_connection(connection_id)? else {
            return Ok(None);
        };

        let Some(room) = self.directory.find_by_id(player.room_id)? else {
            return Ok(None);
        };

        if !room.is_active || room.buzz_locked {
            return Ok(None);
        }

        match self.directory.update_buzz_state(room.id, false, true, Some(player.name.clone())) {
            Ok(_) => {
                let room_hex = format!("{:032x}", room.id);
                tracing::info!(room_id = %room_hex, winner = %player.name, "buzz won the round");
                Ok(Some(BuzzWin { room_id: room.id, winner_name: player.name }))
            },
            // Another buzz was serialized first between our read and our
            // update. Identical to observing a locked room: drop it.
            Err(StorageError::LockConflict { .. }) => {
                let room_hex = format!("{:032x}", room.id);
                tracing::debug!(room_id = %room_hex, loser = %player.name, "buzz lost the race");
                Ok(None)
            },
            // Room vanished between the read and the update.
            Err(StorageError::RoomNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Reset the round: host-authority gated, unconditional overwrite.
    ///
    /// Transitions any room to `{is_active: true, buzz_locked: false,
    /// buzzed_player_name: None}` regardless of prior state. No
    /// compare-and-set here — only the host may call this and the trust
    /// model assumes a single host actor per room.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::RoomNotFound`] if the room is gone,
    /// [`CoordinatorError::Unauthorized`] if the requester is not the
    /// room's host connection.
    pub fn reset_round(
        &self,
        requesting_connection_id: u64,
        room_id: u128,
    ) -> Result<Room, CoordinatorError> {
        let room =
            self.directory.find_by_id(room_id)?.ok_or(CoordinatorError::RoomNotFound)?;

        if room.host_connection_id != requesting_connection_id {
            return Err(CoordinatorError::Unauthorized);
        }

        let updated = self.directory.update_round_control(room_id, true, false, None)?;
        let room_hex = format!("{room_id:032x}");
        tracing::info!(room_id = %room_hex, "round reset");

        Ok(updated)
    }
}

impl<S: Storage> std::fmt::Debug for BuzzArbiter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuzzArbiter").finish_non_exhaustive()
    }
}
