//! Storage error types.
//!
//! Defines errors that can occur during storage operations:
//! - `RoomNotFound` / `PlayerNotFound`: target record doesn't exist
//! - `CodeTaken` / `RoomExists`: uniqueness constraint violations
//! - `LockConflict`: buzz-lock compare-and-set failed
//! - `Io`: underlying storage system errors

use thiserror::Error;

use crate::model::RoomCode;

/// Errors that can occur during storage operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Room record not found.
    #[error("room not found: {0:032x}")]
    RoomNotFound(u128),

    /// Player record not found.
    #[error("player not found: {0}")]
    PlayerNotFound(u64),

    /// Another existing room already holds this code.
    ///
    /// This is the uniqueness constraint the directory's generate-and-retry
    /// loop relies on; callers retry with a fresh code.
    #[error("room code already taken: {0}")]
    CodeTaken(RoomCode),

    /// A room with this identifier already exists.
    #[error("room already exists: {0:032x}")]
    RoomExists(u128),

    /// Buzz-lock compare-and-set failed.
    ///
    /// The stored `buzz_locked` did not match the expected pre-state. For
    /// buzz arbitration this means another buzz won the race; the caller
    /// must treat it as a lost round, never retry.
    #[error("buzz lock conflict: expected locked={expected}, found locked={found}")]
    LockConflict {
        /// Pre-state the caller expected.
        expected: bool,
        /// Lock state actually stored.
        found: bool,
    },

    /// I/O error (file system, database, network to the store, etc.).
    #[error("I/O error: {0}")]
    Io(String),
}
