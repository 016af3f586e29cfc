//! Membership Manager.
//!
//! Creates rooms, admits and removes players, enforces capacity and host
//! authority. All player mutations flow through here; the arbiter only ever
//! touches the buzz-lock state.

use crate::{
    directory::RoomDirectory,
    env::Environment,
    error::CoordinatorError,
    model::{MAX_ROOM_PLAYERS, Player, Room, RoomCode},
    registry::ConnectionRegistry,
    storage::{Storage, StorageError},
};

/// Result of a successful join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    /// The room that was joined.
    pub room: Room,
    /// The freshly created player.
    pub player: Player,
}

/// Result of a successful kick: enough for the caller to sever the removed
/// player's transport connection and announce the removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KickOutcome {
    /// Room the player was removed from.
    pub room_id: u128,
    /// Connection of the removed player, to be forcibly closed.
    pub removed_connection_id: u64,
    /// Identifier of the removed player, for the roster update broadcast.
    pub removed_player_id: u64,
}

/// A player departure observed on disconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    /// Room the player left.
    pub room_id: u128,
    /// Display name, for the departure announcement.
    pub name: String,
}

/// Room creation, admission, and removal.
#[derive(Clone)]
pub struct MembershipManager<S> {
    directory: RoomDirectory<S>,
    registry: ConnectionRegistry<S>,
    storage: S,
}

impl<S: Storage> MembershipManager<S> {
    /// Create a manager over the shared storage.
    pub fn new(storage: S) -> Self {
        Self {
            directory: RoomDirectory::new(storage.clone()),
            registry: ConnectionRegistry::new(storage.clone()),
            storage,
        }
    }

    /// Create a room; the creating connection becomes its host.
    ///
    /// The host is NOT represented as a joinable player — a host-only
    /// connection has no player record.
    ///
    /// # Errors
    ///
    /// Propagates directory/storage failures.
    pub fn create_room(
        &self,
        connection_id: u64,
        host_user_id: u64,
        env: &impl Environment,
    ) -> Result<Room, CoordinatorError> {
        self.directory.create_room(connection_id, host_user_id, env)
    }

    /// Join a room by code, creating a player bound to the connection.
    ///
    /// The capacity check and the insert are deliberately not atomic
    /// against each other: 16 is a soft limit, and a brief overshoot under
    /// concurrent joins is tolerated.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::RoomNotFound`] if no room matches the code,
    /// [`CoordinatorError::RoomFull`] at capacity.
    pub fn join_room(
        &self,
        connection_id: u64,
        code: &RoomCode,
        user_id: u64,
        display_name: String,
        env: &impl Environment,
    ) -> Result<JoinOutcome, CoordinatorError> {
        let room =
            self.directory.find_by_code(code)?.ok_or(CoordinatorError::RoomNotFound)?;

        if self.storage.count_players(room.id)? >= MAX_ROOM_PLAYERS {
            return Err(CoordinatorError::RoomFull);
        }

        let player = Player {
            id: env.random_u64(),
            connection_id,
            name: display_name,
            user_id,
            room_id: room.id,
        };
        self.storage.insert_player(&player)?;

        let room_hex = format!("{:032x}", room.id);
        tracing::info!(room_id = %room_hex, player = %player.name, "player joined");

        Ok(JoinOutcome { room, player })
    }

    /// Remove a player on the host's behalf.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::PlayerNotFound`] if the target is already gone,
    /// [`CoordinatorError::RoomNotFound`] if its room vanished,
    /// [`CoordinatorError::Unauthorized`] unless the requester is the
    /// room's host connection.
    pub fn kick_player(
        &self,
        requesting_connection_id: u64,
        player_id: u64,
    ) -> Result<KickOutcome, CoordinatorError> {
        let player =
            self.storage.player(player_id)?.ok_or(CoordinatorError::PlayerNotFound)?;

        let room =
            self.directory.find_by_id(player.room_id)?.ok_or(CoordinatorError::RoomNotFound)?;

        if room.host_connection_id != requesting_connection_id {
            return Err(CoordinatorError::Unauthorized);
        }

        // The target may have disconnected since the host looked at the
        // roster; that race resolves as PlayerNotFound.
        let removed = match self.storage.delete_player(player_id) {
            Ok(removed) => removed,
            Err(StorageError::PlayerNotFound(_)) => {
                return Err(CoordinatorError::PlayerNotFound);
            },
            Err(e) => return Err(e.into()),
        };

        let room_hex = format!("{:032x}", room.id);
        tracing::info!(room_id = %room_hex, player = %removed.name, "player kicked");

        Ok(KickOutcome {
            room_id: room.id,
            removed_connection_id: removed.connection_id,
            removed_player_id: removed.id,
        })
    }

    /// Handle a connection closing.
    ///
    /// If a player was bound to the connection, the record is deleted and
    /// the departure returned for a room-wide announcement. A miss (host
    /// connection, already-kicked player) is a normal `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Only genuine storage faults propagate.
    pub fn handle_disconnect(
        &self,
        connection_id: u64,
    ) -> Result<Option<Departure>, StorageError> {
        let Some(player) = self.registry.lookup_player_by_connection(connection_id)? else {
            return Ok(None);
        };

        match self.storage.delete_player(player.id) {
            Ok(removed) => {
                let room_hex = format!("{:032x}", removed.room_id);
                tracing::info!(room_id = %room_hex, player = %removed.name, "player disconnected");
                Ok(Some(Departure { room_id: removed.room_id, name: removed.name }))
            },
            // Lost a race with a kick; the announcement already happened.
            Err(StorageError::PlayerNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
