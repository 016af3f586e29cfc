//! Read-only HTTP query surface.
//!
//! Listing and inspection endpoints for lobby UIs; all game traffic goes
//! over the WebSocket. "Room not found" maps to 404, storage faults to 500,
//! and neither affects any live connection.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use buzzline_core::{RoomDetail, RoomSummary};

use crate::AppState;

/// `GET /rooms` — all rooms with player counts, newest first.
pub(crate) async fn list_rooms(
    State(state): State<AppState>,
) -> Result<Json<Vec<RoomSummary>>, StatusCode> {
    state.coordinator.list_rooms().map(Json).map_err(|e| {
        tracing::error!(error = %e, "room listing failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// `GET /rooms/{code}` — one room with its player roster.
pub(crate) async fn room_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<RoomDetail>, StatusCode> {
    match state.coordinator.room_by_code(&code) {
        Ok(Some(detail)) => Ok(Json(detail)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!(error = %e, %code, "room lookup failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        },
    }
}
