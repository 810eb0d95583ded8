use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppError,
    services::sse_service::{self, StreamKind},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/sessions/{id}/events",
    tag = "sse",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Session cue and snapshot stream", content_type = "text/event-stream", body = String),
        (status = 404, description = "Unknown session")
    )
)]
/// Stream the cues and snapshots of one session.
pub async fn session_stream(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let receiver = sse_service::subscribe_session(&state, id)?;
    info!(session_id = %id, "New session SSE connection");
    let kind = StreamKind::Session(id);
    let handshake = sse_service::handshake_event(&state, kind);
    Ok(sse_service::to_sse_stream(receiver, handshake, kind))
}

#[utoipa::path(
    get,
    path = "/sse/leaderboard",
    tag = "sse",
    responses((status = 200, description = "Leaderboard refresh stream", content_type = "text/event-stream", body = String))
)]
/// Stream leaderboard refreshes and degraded-mode changes.
pub async fn leaderboard_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = sse_service::subscribe_leaderboard(&state);
    info!("New leaderboard SSE connection");
    let handshake = sse_service::handshake_event(&state, StreamKind::Leaderboard);
    sse_service::to_sse_stream(receiver, handshake, StreamKind::Leaderboard)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/sessions/{id}/events", get(session_stream))
        .route("/sse/leaderboard", get(leaderboard_stream))
}
