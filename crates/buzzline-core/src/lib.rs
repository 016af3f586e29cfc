//! Buzzline coordination engine.
//!
//! Sans-IO core of a multiplayer buzzer quiz server: a host opens a room,
//! players join by a six-character code, and during a live round exactly one
//! of any number of simultaneous buzzes wins.
//!
//! # Architecture
//!
//! ```text
//! Transport (WebSocket, elsewhere)
//!   └─ RoomCoordinator (facade)         ← events in, actions out
//!       ├─ MembershipManager            ← create/join/kick/disconnect
//!       ├─ BuzzArbiter                  ← first-to-buzz CAS, round reset
//!       │   ├─ RoomDirectory            ← code → room, listings, updates
//!       │   └─ ConnectionRegistry       ← connection → player
//!       └─ Storage                      ← uniqueness + conditional update
//! ```
//!
//! The engine performs no I/O: every inbound event produces a list of
//! [`OutboundAction`]s for the transport layer to execute. Correctness under
//! concurrency rests on two storage-contract guarantees rather than locks —
//! the uniqueness constraint on room codes and the compare-and-set
//! transition of the buzz lock. See [`BuzzArbiter`] for why read-then-write
//! is not acceptable there.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod arbiter;
mod coordinator;
mod directory;
pub mod env;
mod error;
pub mod event;
mod membership;
mod model;
mod registry;
pub mod storage;

pub use arbiter::{BuzzArbiter, BuzzWin};
pub use coordinator::{OutboundAction, RoomCoordinator, RoomDetail};
pub use directory::{RoomDirectory, RoomSummary};
pub use error::CoordinatorError;
pub use event::{ClientCommand, PlayerListUpdate, ServerEvent};
pub use membership::{Departure, JoinOutcome, KickOutcome, MembershipManager};
pub use model::{
    CODE_ALPHABET, CODE_LEN, InvalidRoomCode, MAX_ROOM_PLAYERS, Player, Room, RoomCode,
};
pub use registry::ConnectionRegistry;
