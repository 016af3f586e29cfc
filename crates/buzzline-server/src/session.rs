//! Session registry for outbound channels and room subscriptions.
//!
//! The registry maintains bidirectional mappings: room → sessions (for
//! broadcast) and session → rooms (for cleanup on disconnect), plus each
//! session's outbound message channel. This enables O(1) lookups in both
//! directions.
//!
//! Sessions must explicitly subscribe to rooms — the coordinator emits a
//! `Subscribe` action when a host creates or a player joins. Unregistering
//! a session removes all its subscriptions.

use std::collections::{HashMap, HashSet};

use tokio::sync::mpsc;

/// Registry of live sessions, their outbound channels, and their room
/// subscriptions.
///
/// Generic over the outbound message type so tests can use plain strings
/// where the server uses WebSocket messages.
#[derive(Debug, Default)]
pub(crate) struct SessionRegistry<T> {
    /// Session ID → outbound channel
    senders: HashMap<u64, mpsc::UnboundedSender<T>>,
    /// Room ID → set of subscribed session IDs
    room_subscriptions: HashMap<u128, HashSet<u64>>,
    /// Session ID → set of subscribed room IDs
    session_rooms: HashMap<u64, HashSet<u128>>,
}

impl<T> SessionRegistry<T> {
    /// Create a new empty registry.
    pub(crate) fn new() -> Self {
        Self {
            senders: HashMap::new(),
            room_subscriptions: HashMap::new(),
            session_rooms: HashMap::new(),
        }
    }

    /// Register a new session with its outbound channel.
    ///
    /// Returns `false` if the session already exists.
    pub(crate) fn register(&mut self, session_id: u64, sender: mpsc::UnboundedSender<T>) -> bool {
        if self.senders.contains_key(&session_id) {
            return false;
        }

        self.senders.insert(session_id, sender);
        self.session_rooms.insert(session_id, HashSet::new());
        true
    }

    /// Unregister a session and remove all its room subscriptions.
    ///
    /// Returns the rooms it was subscribed to, or `None` if unknown.
    pub(crate) fn unregister(&mut self, session_id: u64) -> Option<HashSet<u128>> {
        self.senders.remove(&session_id)?;
        let rooms = self.session_rooms.remove(&session_id).unwrap_or_default();

        for room_id in &rooms {
            if let Some(subscribers) = self.room_subscriptions.get_mut(room_id) {
                subscribers.remove(&session_id);
                if subscribers.is_empty() {
                    self.room_subscriptions.remove(room_id);
                }
            }
        }

        Some(rooms)
    }

    /// Subscribe a session to a room's broadcast channel.
    ///
    /// Returns `false` if the session is not registered.
    pub(crate) fn subscribe(&mut self, session_id: u64, room_id: u128) -> bool {
        if !self.senders.contains_key(&session_id) {
            return false;
        }

        self.room_subscriptions.entry(room_id).or_default().insert(session_id);
        self.session_rooms.entry(session_id).or_default().insert(room_id);
        true
    }

    /// Outbound channel for a session. `None` if not registered.
    pub(crate) fn sender(&self, session_id: u64) -> Option<&mpsc::UnboundedSender<T>> {
        self.senders.get(&session_id)
    }

    /// All sessions subscribed to a room.
    pub(crate) fn sessions_in_room(&self, room_id: u128) -> impl Iterator<Item = u64> + '_ {
        self.room_subscriptions.get(&room_id).into_iter().flat_map(|s| s.iter().copied())
    }

    /// Total number of registered sessions.
    pub(crate) fn session_count(&self) -> usize {
        self.senders.len()
    }

    /// Number of sessions subscribed to a room.
    #[cfg_attr(not(test), allow(dead_code))]
    pub(crate) fn room_session_count(&self, room_id: u128) -> usize {
        self.room_subscriptions.get(&room_id).map_or(0, HashSet::len)
    }
}
