//! WebSocket connection handling.
//!
//! One task per connection: a spawned writer drains the session's outbound
//! channel into the socket, while the reader loop decodes one
//! [`ClientCommand`](buzzline_core::ClientCommand) per text message and
//! feeds it to the coordinator. Connection identity is a random `u64`
//! assigned at upgrade time; the core never sees the socket.

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{CloseFrame, Message, WebSocket, close_code},
    },
    response::Response,
};
use buzzline_core::{ClientCommand, env::Environment};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::{AppState, execute_actions};

/// Upgrade handler for `GET /ws`.
pub(crate) async fn game_socket(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: AppState, mut socket: WebSocket) {
    let session_id = state.env.random_u64();

    if state.sessions.read().await.session_count() >= state.max_connections {
        tracing::warn!(session_id, "max connections exceeded, rejecting");
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: close_code::AGAIN,
                reason: "server full".into(),
            })))
            .await;
        return;
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    state.sessions.write().await.register(session_id, tx);
    tracing::debug!(session_id, "connection accepted");

    let (mut sink, mut stream) = socket.split();

    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let closing = matches!(message, Message::Close(_));
            if sink.send(message).await.is_err() || closing {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        let Message::Text(text) = message else {
            // Binary frames are not part of the protocol; pings are answered
            // by the library.
            continue;
        };

        match serde_json::from_str::<ClientCommand>(text.as_str()) {
            Ok(command) => {
                let actions = state.coordinator.handle_command(session_id, command);
                execute_actions(&state, actions).await;
            },
            Err(e) => {
                tracing::debug!(session_id, error = %e, "ignoring malformed command");
            },
        }
    }

    // Transport closed (tab closed, network drop, or a kick we initiated).
    let actions = state.coordinator.handle_disconnect(session_id);
    execute_actions(&state, actions).await;

    state.sessions.write().await.unregister(session_id);
    send_task.abort();
    tracing::debug!(session_id, "connection closed");
}
