//! Room and player records.
//!
//! These are the only records the engine persists. Identifiers follow the
//! convention used throughout the crate: `u128` for rooms, `u64` for players,
//! users, and connections. Connection identifiers are assigned by the
//! transport layer and are opaque here.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::env::Environment;

/// Number of characters in a room code.
pub const CODE_LEN: usize = 6;

/// Alphabet room codes are drawn from.
pub const CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Maximum number of players admitted to one room.
pub const MAX_ROOM_PLAYERS: usize = 16;

/// A short human-enterable room code: six characters from `A–Z0–9`.
///
/// Codes are unique among currently existing rooms (enforced by storage, see
/// [`crate::storage::Storage::insert_room`]) and immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

/// Reason a string failed to parse as a room code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRoomCode {
    /// Input was not exactly [`CODE_LEN`] characters.
    #[error("room code must be {CODE_LEN} characters, got {0}")]
    WrongLength(usize),

    /// Input contained a character outside `A–Z0–9`.
    #[error("room code contains invalid character {0:?}")]
    BadCharacter(char),
}

impl RoomCode {
    /// Draws a random code from the alphabet.
    ///
    /// Uniqueness is NOT checked here; callers race the storage layer's
    /// uniqueness constraint and retry on collision (see
    /// `RoomDirectory::create_room`).
    pub fn generate(env: &impl Environment) -> Self {
        let mut bytes = [0u8; CODE_LEN];
        env.random_bytes(&mut bytes);

        let code = bytes
            .iter()
            .map(|b| CODE_ALPHABET[*b as usize % CODE_ALPHABET.len()] as char)
            .collect();

        Self(code)
    }

    /// Parses user input into a code, normalizing to uppercase.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRoomCode`] if the input is not six characters from
    /// the code alphabet.
    pub fn parse(input: &str) -> Result<Self, InvalidRoomCode> {
        let normalized = input.trim().to_ascii_uppercase();

        if normalized.chars().count() != CODE_LEN {
            return Err(InvalidRoomCode::WrongLength(normalized.chars().count()));
        }

        for c in normalized.chars() {
            if !CODE_ALPHABET.contains(&(c as u8)) {
                return Err(InvalidRoomCode::BadCharacter(c));
            }
        }

        Ok(Self(normalized))
    }

    /// The code as a displayable string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = InvalidRoomCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

/// One game session: a host, a roster of players, and the buzz-lock state
/// for the current round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Opaque unique identifier, assigned at creation.
    pub id: u128,
    /// Human-enterable join code, unique among existing rooms.
    pub code: RoomCode,
    /// Connection that created the room; authoritative for host-only
    /// actions. Goes stale if the host reconnects (documented behavior).
    pub host_connection_id: u64,
    /// External identity of the creator. Recorded so a deployment can layer
    /// host re-authentication on top; the core authority check does not
    /// consult it.
    pub host_user_id: u64,
    /// Round is live when true.
    pub is_active: bool,
    /// True once a player has buzzed this round, blocking further buzzes.
    pub buzz_locked: bool,
    /// Name of the current round's winner.
    ///
    /// Invariant: `Some` iff `buzz_locked`.
    pub buzzed_player_name: Option<String>,
    /// Wall-clock creation time, used only for listing order.
    pub created_at_secs: u64,
}

impl Room {
    /// Whether the lock/winner pair is consistent: locked iff a winner is
    /// recorded.
    pub fn buzz_state_consistent(&self) -> bool {
        self.buzz_locked == self.buzzed_player_name.is_some()
    }
}

/// A joined player, bound to one live connection and one room for its
/// lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Opaque unique identifier.
    pub id: u64,
    /// Current live connection; overwritten on reconnect, the whole record
    /// is deleted on disconnect.
    pub connection_id: u64,
    /// Display name. Uniqueness within a room is informal, not enforced.
    pub name: String,
    /// External identity reference supplied by the authentication
    /// collaborator.
    pub user_id: u64,
    /// Owning room, fixed for the player's lifetime.
    pub room_id: u128,
}
