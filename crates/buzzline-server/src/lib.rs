//! Buzzline production server.
//!
//! Production "glue" that wraps [`buzzline_core`]'s action-based engine with
//! real I/O: axum WebSocket transport for game traffic, a small read-only
//! HTTP surface for lobby queries, Tokio for the runtime, and system time
//! with cryptographic RNG.
//!
//! # Components
//!
//! - [`Server`]: runtime that binds, routes, and executes coordinator
//!   actions
//! - `SessionRegistry`: per-session outbound channels and room channel
//!   membership (the transport half of "broadcast to room")
//! - [`SystemEnv`]: production environment (real clock, OS RNG)
//!
//! The engine stays Sans-IO: each inbound event yields a list of
//! [`OutboundAction`]s, and the action executor in this module is the only
//! place they touch sockets.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod queries;
mod session;
mod system_env;
mod ws;

use std::sync::Arc;

use axum::{
    Router,
    extract::ws::{CloseFrame, Message, close_code},
    routing::get,
};
use buzzline_core::{OutboundAction, RoomCoordinator, ServerEvent, storage::MemoryStorage};
pub use error::ServerError;
use session::SessionRegistry;
pub use system_env::SystemEnv;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

/// Server configuration for the production runtime.
#[derive(Debug, Clone)]
pub struct ServerRuntimeConfig {
    /// Address to bind to (e.g., "0.0.0.0:3000")
    pub bind_address: String,
    /// Maximum concurrent WebSocket connections
    pub max_connections: usize,
}

impl Default for ServerRuntimeConfig {
    fn default() -> Self {
        Self { bind_address: "0.0.0.0:3000".to_string(), max_connections: 10_000 }
    }
}

/// Shared state handed to every handler.
#[derive(Clone)]
pub(crate) struct AppState {
    /// The Sans-IO coordination engine.
    coordinator: RoomCoordinator<MemoryStorage, SystemEnv>,
    /// Outbound channels and room channel membership.
    sessions: Arc<RwLock<SessionRegistry<Message>>>,
    /// Environment, for assigning connection identifiers.
    env: SystemEnv,
    /// Connection cap enforced at upgrade time.
    max_connections: usize,
}

/// Production Buzzline server.
///
/// Wraps the coordinator with axum transport and the system environment.
pub struct Server {
    listener: tokio::net::TcpListener,
    state: AppState,
}

impl Server {
    /// Create and bind a new server.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] if the address cannot be bound.
    pub async fn bind(config: ServerRuntimeConfig) -> Result<Self, ServerError> {
        let env = SystemEnv::new();
        let coordinator = RoomCoordinator::new(MemoryStorage::new(), env.clone());

        let state = AppState {
            coordinator,
            sessions: Arc::new(RwLock::new(SessionRegistry::new())),
            env,
            max_connections: config.max_connections,
        };

        let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;

        Ok(Self { listener, state })
    }

    /// Local address the server is bound to.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] if the socket is gone.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the server until shutdown or a fatal transport error.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] if the accept loop fails.
    pub async fn run(self) -> Result<(), ServerError> {
        let app = router(self.state);
        axum::serve(self.listener, app).await?;
        Ok(())
    }
}

/// The full route table: WebSocket upgrade plus the read-only queries.
fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws::game_socket))
        .route("/rooms", get(queries::list_rooms))
        .route("/rooms/{code}", get(queries::room_by_code))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Execute coordinator actions against live sessions.
///
/// Delivery failures are logged and dropped: a send to a session that
/// closed mid-flight must never affect the other connections in the room.
pub(crate) async fn execute_actions(state: &AppState, actions: Vec<OutboundAction>) {
    for action in actions {
        match action {
            OutboundAction::Reply { connection_id, event } => {
                let Some(text) = encode_event(&event) else { continue };

                let sessions = state.sessions.read().await;
                match sessions.sender(connection_id) {
                    Some(tx) => {
                        if tx.send(Message::Text(text.into())).is_err() {
                            tracing::debug!(connection_id, "reply to closing session dropped");
                        }
                    },
                    None => tracing::debug!(connection_id, "reply target not registered"),
                }
            },

            OutboundAction::Broadcast { room_id, event } => {
                let Some(text) = encode_event(&event) else { continue };

                let sessions = state.sessions.read().await;
                for session_id in sessions.sessions_in_room(room_id) {
                    if let Some(tx) = sessions.sender(session_id) {
                        let _ = tx.send(Message::Text(text.clone().into()));
                    }
                }
            },

            OutboundAction::Subscribe { connection_id, room_id } => {
                if !state.sessions.write().await.subscribe(connection_id, room_id) {
                    tracing::warn!(connection_id, "subscribe for unregistered session");
                }
            },

            OutboundAction::Disconnect { connection_id, reason } => {
                let mut sessions = state.sessions.write().await;
                if let Some(tx) = sessions.sender(connection_id) {
                    let _ = tx.send(Message::Close(Some(CloseFrame {
                        code: close_code::NORMAL,
                        reason: reason.clone().into(),
                    })));
                }
                sessions.unregister(connection_id);
                tracing::info!(connection_id, %reason, "connection severed");
            },
        }
    }
}

fn encode_event(event: &ServerEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode outbound event");
            None
        },
    }
}
