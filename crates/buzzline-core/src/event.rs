//! Wire event vocabulary.
//!
//! The closed set of inbound commands and outbound events, JSON on the
//! wire, internally tagged with `"type"` in kebab-case. The transport layer
//! decodes one [`ClientCommand`] per message and delivers [`ServerEvent`]s
//! verbatim; neither side ever dispatches on free-form event names.

use serde::{Deserialize, Serialize};

/// Inbound command from one connection.
///
/// Connection identity is carried out-of-band by the transport; a buzz has
/// no payload at all. Connection close is not a wire event — the transport
/// reports it to the coordinator directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientCommand {
    /// Open a room; the sender becomes host.
    CreateRoom {
        /// Authenticated identity of the would-be host.
        host_user_id: u64,
    },

    /// Join an existing room by code.
    JoinRoom {
        /// Human-entered room code (case-insensitive).
        room_code: String,
        /// Authenticated identity of the joining user.
        user_id: u64,
        /// Name shown to the rest of the room.
        display_name: String,
    },

    /// Buzz in on the current round.
    Buzz,

    /// Host only: reopen the round.
    ResetRound {
        /// Room to reset.
        room_id: u128,
    },

    /// Host only: remove a player.
    KickPlayer {
        /// Player to remove.
        player_id: u64,
    },
}

/// Outbound event, either replied to one connection or broadcast to a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Reply to the creating host.
    RoomCreated {
        /// Identifier of the new room.
        room_id: u128,
        /// Join code to hand out to players.
        room_code: String,
    },

    /// Reply to a player that just joined.
    Joined {
        /// The player's identifier.
        player_id: u64,
        /// The name the room will see.
        name: String,
    },

    /// Broadcast when a player joins.
    PlayerJoined {
        /// Display name of the newcomer.
        name: String,
    },

    /// Broadcast when a buzz wins the round.
    PlayerBuzzed {
        /// Display name of the winner.
        winner: String,
    },

    /// Broadcast alongside `player-buzzed`; prompts the host to validate or
    /// reset.
    HostActionRequired {
        /// Display name of the winner.
        winner: String,
    },

    /// Broadcast when the host reopens the round.
    RoundReset,

    /// Broadcast when the roster changes outside of a join.
    PlayerListUpdated(PlayerListUpdate),

    /// Reply to a player being removed, sent before their connection is
    /// severed.
    Kicked {
        /// Human-readable reason.
        reason: String,
    },

    /// Reply carrying a user-facing failure; only ever sent to the
    /// originating connection.
    Error {
        /// Human-readable message.
        message: String,
    },
}

/// Payload of a `player-list-updated` broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlayerListUpdate {
    /// A player was removed by the host.
    Removed {
        /// Identifier of the removed player.
        removed_player_id: u64,
    },

    /// A player's connection closed.
    Departed {
        /// Announcement text, e.g. `"Ada left the room"`.
        message: String,
    },
}
