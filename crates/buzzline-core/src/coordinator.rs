//! Room Coordinator.
//!
//! Single entry point the transport layer calls for each inbound event.
//! Translates `(connection id, command)` pairs into component calls and
//! packages the results as outbound actions; executing those actions
//! (sending frames, joining broadcast channels, severing connections) is
//! the transport layer's job. The coordinator holds no state of its own
//! beyond wiring — every piece of shared mutable state lives behind the
//! storage contract, which is what lets events for the same room run
//! concurrently without a room lock.
//!
//! Failure policy: user-facing failures from join/kick/reset become an
//! `error` reply to the originating connection only. Buzz losses and
//! disconnect misses are steady-state outcomes and produce nothing.
//! Storage faults on the buzz path are logged and dropped — the buzzer
//! experiences a lost buzz. No failure here is fatal to the process.

use serde::Serialize;

use crate::{
    arbiter::BuzzArbiter,
    directory::{RoomDirectory, RoomSummary},
    env::Environment,
    error::CoordinatorError,
    event::{ClientCommand, PlayerListUpdate, ServerEvent},
    membership::MembershipManager,
    model::{Player, Room, RoomCode},
    storage::{Storage, StorageError},
};

/// Message sent to a player being removed, before their connection closes.
const KICKED_REASON: &str = "removed from the room by the host";

/// An instruction for the transport layer, produced by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundAction {
    /// Send an event to one connection.
    Reply {
        /// Target connection.
        connection_id: u64,
        /// Event to deliver.
        event: ServerEvent,
    },

    /// Send an event to every connection subscribed to a room's channel.
    Broadcast {
        /// Target room.
        room_id: u128,
        /// Event to deliver.
        event: ServerEvent,
    },

    /// Join a connection to a room's broadcast channel (host on create,
    /// player on join).
    Subscribe {
        /// Connection to subscribe.
        connection_id: u64,
        /// Room channel to join.
        room_id: u128,
    },

    /// Forcibly sever a connection (kick target).
    Disconnect {
        /// Connection to close.
        connection_id: u64,
        /// Human-readable reason.
        reason: String,
    },
}

/// A room with its full player roster, for the query surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomDetail {
    /// The room record.
    #[serde(flatten)]
    pub room: Room,
    /// Players currently joined.
    pub players: Vec<Player>,
}

/// Facade composing the directory, membership manager, and buzz arbiter.
#[derive(Clone)]
pub struct RoomCoordinator<S, E> {
    directory: RoomDirectory<S>,
    membership: MembershipManager<S>,
    arbiter: BuzzArbiter<S>,
    storage: S,
    env: E,
}

impl<S: Storage, E: Environment> RoomCoordinator<S, E> {
    /// Create a coordinator over the shared storage and environment.
    pub fn new(storage: S, env: E) -> Self {
        Self {
            directory: RoomDirectory::new(storage.clone()),
            membership: MembershipManager::new(storage.clone()),
            arbiter: BuzzArbiter::new(storage.clone()),
            storage,
            env,
        }
    }

    /// Process one inbound command and return the actions to execute.
    pub fn handle_command(&self, connection_id: u64, command: ClientCommand) -> Vec<OutboundAction> {
        match command {
            ClientCommand::CreateRoom { host_user_id } => {
                self.create_room(connection_id, host_user_id)
            },
            ClientCommand::JoinRoom { room_code, user_id, display_name } => {
                self.join_room(connection_id, &room_code, user_id, display_name)
            },
            ClientCommand::Buzz => self.buzz(connection_id),
            ClientCommand::ResetRound { room_id } => self.reset_round(connection_id, room_id),
            ClientCommand::KickPlayer { player_id } => self.kick_player(connection_id, player_id),
        }
    }

    /// Process a connection closing.
    ///
    /// Announces the departure to the room if a player was bound; silent
    /// otherwise.
    pub fn handle_disconnect(&self, connection_id: u64) -> Vec<OutboundAction> {
        match self.membership.handle_disconnect(connection_id) {
            Ok(Some(departure)) => vec![OutboundAction::Broadcast {
                room_id: departure.room_id,
                event: ServerEvent::PlayerListUpdated(PlayerListUpdate::Departed {
                    message: format!("{} left the room", departure.name),
                }),
            }],
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(connection_id, error = %e, "disconnect handling failed");
                Vec::new()
            },
        }
    }

    /// All rooms with player counts, newest first. Read-only query surface.
    ///
    /// # Errors
    ///
    /// Propagates storage faults.
    pub fn list_rooms(&self) -> Result<Vec<RoomSummary>, StorageError> {
        self.directory.list_all()
    }

    /// One room by code with its player roster. `Ok(None)` covers both an
    /// unknown code and input that cannot be a code at all.
    ///
    /// # Errors
    ///
    /// Propagates storage faults.
    pub fn room_by_code(&self, code: &str) -> Result<Option<RoomDetail>, StorageError> {
        let Ok(code) = RoomCode::parse(code) else {
            return Ok(None);
        };

        let Some(room) = self.directory.find_by_code(&code)? else {
            return Ok(None);
        };

        let players = self.storage.players_in_room(room.id)?;
        Ok(Some(RoomDetail { room, players }))
    }

    fn create_room(&self, connection_id: u64, host_user_id: u64) -> Vec<OutboundAction> {
        match self.membership.create_room(connection_id, host_user_id, &self.env) {
            Ok(room) => vec![
                OutboundAction::Subscribe { connection_id, room_id: room.id },
                OutboundAction::Reply {
                    connection_id,
                    event: ServerEvent::RoomCreated {
                        room_id: room.id,
                        room_code: room.code.to_string(),
                    },
                },
            ],
            Err(e) => self.error_reply(connection_id, &e),
        }
    }

    fn join_room(
        &self,
        connection_id: u64,
        room_code: &str,
        user_id: u64,
        display_name: String,
    ) -> Vec<OutboundAction> {
        // Input that cannot be a code cannot match a room either.
        let Ok(code) = RoomCode::parse(room_code) else {
            return self.error_reply(connection_id, &CoordinatorError::RoomNotFound);
        };

        match self.membership.join_room(connection_id, &code, user_id, display_name, &self.env) {
            Ok(outcome) => vec![
                OutboundAction::Subscribe { connection_id, room_id: outcome.room.id },
                OutboundAction::Reply {
                    connection_id,
                    event: ServerEvent::Joined {
                        player_id: outcome.player.id,
                        name: outcome.player.name.clone(),
                    },
                },
                OutboundAction::Broadcast {
                    room_id: outcome.room.id,
                    event: ServerEvent::PlayerJoined { name: outcome.player.name },
                },
            ],
            Err(e) => self.error_reply(connection_id, &e),
        }
    }

    fn buzz(&self, connection_id: u64) -> Vec<OutboundAction> {
        match self.arbiter.handle_buzz(connection_id) {
            Ok(Some(win)) => vec![
                OutboundAction::Broadcast {
                    room_id: win.room_id,
                    event: ServerEvent::PlayerBuzzed { winner: win.winner_name.clone() },
                },
                OutboundAction::Broadcast {
                    room_id: win.room_id,
                    event: ServerEvent::HostActionRequired { winner: win.winner_name },
                },
            ],
            // Lost buzzes are invisible to the loser.
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(connection_id, error = %e, "buzz dropped on storage fault");
                Vec::new()
            },
        }
    }

    fn reset_round(&self, connection_id: u64, room_id: u128) -> Vec<OutboundAction> {
        match self.arbiter.reset_round(connection_id, room_id) {
            Ok(room) => vec![OutboundAction::Broadcast {
                room_id: room.id,
                event: ServerEvent::RoundReset,
            }],
            Err(e) => self.error_reply(connection_id, &e),
        }
    }

    fn kick_player(&self, connection_id: u64, player_id: u64) -> Vec<OutboundAction> {
        match self.membership.kick_player(connection_id, player_id) {
            Ok(outcome) => vec![
                OutboundAction::Reply {
                    connection_id: outcome.removed_connection_id,
                    event: ServerEvent::Kicked { reason: KICKED_REASON.to_string() },
                },
                OutboundAction::Disconnect {
                    connection_id: outcome.removed_connection_id,
                    reason: KICKED_REASON.to_string(),
                },
                OutboundAction::Broadcast {
                    room_id: outcome.room_id,
                    event: ServerEvent::PlayerListUpdated(PlayerListUpdate::Removed {
                        removed_player_id: outcome.removed_player_id,
                    }),
                },
            ],
            Err(e) => self.error_reply(connection_id, &e),
        }
    }

    fn error_reply(&self, connection_id: u64, error: &CoordinatorError) -> Vec<OutboundAction> {
        tracing::warn!(connection_id, error = %error, "command failed");

        vec![OutboundAction::Reply {
            connection_id,
            event: ServerEvent::Error { message: error.to_string() },
        }]
    }
}

impl<S: Storage, E: Environment> std::fmt::Debug for RoomCoordinator<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomCoordinator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::storage::MemoryStorage;

    #[derive(Clone)]
    struct CountingEnv {
        counter: Arc<Mutex<u8>>,
    }

    impl CountingEnv {
        fn new() -> Self {
            Self { counter: Arc::new(Mutex::new(0)) }
        }
    }

    impl Environment for CountingEnv {
        fn wall_clock_secs(&self) -> u64 {
            0
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            let mut counter = self.counter.lock().unwrap();
            for slot in buffer.iter_mut() {
                *counter = counter.wrapping_add(1);
                *slot = *counter;
            }
        }
    }

    fn coordinator() -> RoomCoordinator<MemoryStorage, CountingEnv> {
        RoomCoordinator::new(MemoryStorage::new(), CountingEnv::new())
    }

    fn created_room_id(actions: &[OutboundAction]) -> u128 {
        actions
            .iter()
            .find_map(|a| match a {
                OutboundAction::Reply {
                    event: ServerEvent::RoomCreated { room_id, .. }, ..
                } => Some(*room_id),
                _ => None,
            })
            .expect("no room-created reply")
    }

    #[test]
    fn create_room_subscribes_host_and_replies() {
        let coordinator = coordinator();

        let actions =
            coordinator.handle_command(10, ClientCommand::CreateRoom { host_user_id: 100 });

        assert_eq!(actions.len(), 2);
        let room_id = created_room_id(&actions);
        assert_eq!(
            actions[0],
            OutboundAction::Subscribe { connection_id: 10, room_id }
        );
    }

    #[test]
    fn join_replies_then_announces() {
        let coordinator = coordinator();
        let actions =
            coordinator.handle_command(10, ClientCommand::CreateRoom { host_user_id: 100 });
        let room_id = created_room_id(&actions);

        let code = coordinator
            .list_rooms()
            .unwrap()
            .into_iter()
            .find(|s| s.room.id == room_id)
            .unwrap()
            .room
            .code
            .to_string();

        let actions = coordinator.handle_command(70, ClientCommand::JoinRoom {
            room_code: code,
            user_id: 700,
            display_name: "Ada".to_string(),
        });

        assert_eq!(actions.len(), 3);
        assert!(matches!(
            &actions[0],
            OutboundAction::Subscribe { connection_id: 70, .. }
        ));
        assert!(matches!(
            &actions[1],
            OutboundAction::Reply { connection_id: 70, event: ServerEvent::Joined { .. } }
        ));
        assert_eq!(
            actions[2],
            OutboundAction::Broadcast {
                room_id,
                event: ServerEvent::PlayerJoined { name: "Ada".to_string() },
            }
        );
    }

    #[test]
    fn malformed_room_code_reads_as_not_found() {
        let coordinator = coordinator();

        let actions = coordinator.handle_command(70, ClientCommand::JoinRoom {
            room_code: "not a code".to_string(),
            user_id: 700,
            display_name: "Ada".to_string(),
        });

        assert_eq!(actions.len(), 1);
        assert!(matches!(
            &actions[0],
            OutboundAction::Reply { connection_id: 70, event: ServerEvent::Error { .. } }
        ));
    }

    #[test]
    fn failures_reply_only_to_the_originator() {
        let coordinator = coordinator();
        let actions =
            coordinator.handle_command(10, ClientCommand::CreateRoom { host_user_id: 100 });
        let room_id = created_room_id(&actions);

        // Non-host reset: exactly one action, an error reply to connection 99.
        let actions = coordinator.handle_command(99, ClientCommand::ResetRound { room_id });
        assert_eq!(actions.len(), 1);
        assert!(matches!(
            &actions[0],
            OutboundAction::Reply { connection_id: 99, event: ServerEvent::Error { .. } }
        ));
    }

    #[test]
    fn query_surface_returns_roster() {
        let coordinator = coordinator();
        let actions =
            coordinator.handle_command(10, ClientCommand::CreateRoom { host_user_id: 100 });
        let room_id = created_room_id(&actions);
        let code = coordinator.list_rooms().unwrap()[0].room.code.to_string();

        coordinator.handle_command(70, ClientCommand::JoinRoom {
            room_code: code.clone(),
            user_id: 700,
            display_name: "Ada".to_string(),
        });

        let detail = coordinator.room_by_code(&code).unwrap().unwrap();
        assert_eq!(detail.room.id, room_id);
        assert_eq!(detail.players.len(), 1);
        assert_eq!(detail.players[0].name, "Ada");

        assert!(coordinator.room_by_code("ZZZZZZ").unwrap().is_none());
        assert!(coordinator.room_by_code("???").unwrap().is_none());
    }
}
