//! Engine error taxonomy.
//!
//! Every user-facing failure from join/kick/reset maps to one of these kinds
//! and is reported only to the originating connection. Buzz losses and
//! disconnect no-ops are deliberately NOT errors — they are expected
//! steady-state outcomes and never surface anywhere.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors from room coordination operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    /// No room matches the supplied code or id.
    #[error("room not found")]
    RoomNotFound,

    /// The room already holds the maximum number of players.
    #[error("room is full")]
    RoomFull,

    /// The requesting connection is not the room's host.
    #[error("not authorized")]
    Unauthorized,

    /// The targeted player no longer exists.
    #[error("player not found")]
    PlayerNotFound,

    /// The directory could not allocate an unused room code.
    ///
    /// Only reachable when the code space is pathologically full; the
    /// generate-and-retry loop gives up instead of spinning.
    #[error("could not allocate a unique room code")]
    CodeSpaceExhausted,

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
