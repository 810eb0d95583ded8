use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dto::sse::{Handshake, ServerEvent},
    error::ServiceError,
    state::SharedState,
};

/// Identifies the stream being served, for logging on disconnect.
#[derive(Clone, Copy, Debug)]
pub enum StreamKind {
    /// Cues and snapshots of one session.
    Session(Uuid),
    /// Global leaderboard refreshes.
    Leaderboard,
}

/// Subscribe to the events of one live session.
pub fn subscribe_session(
    state: &SharedState,
    session_id: Uuid,
) -> Result<broadcast::Receiver<ServerEvent>, ServiceError> {
    let handle = state
        .session(session_id)
        .ok_or_else(|| ServiceError::NotFound(format!("session {session_id}")))?;
    Ok(handle.events().subscribe())
}

/// Subscribe to leaderboard refreshes.
pub fn subscribe_leaderboard(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.leaderboard_sse().subscribe()
}

/// First event sent on every stream.
pub fn handshake_event(state: &SharedState, kind: StreamKind) -> Option<ServerEvent> {
    let (stream, message) = match kind {
        StreamKind::Session(id) => ("session", format!("subscribed to session {id}")),
        StreamKind::Leaderboard => ("leaderboard", "subscribed to leaderboard".to_string()),
    };
    ServerEvent::json(
        "handshake",
        &Handshake {
            stream: stream.to_string(),
            message,
            degraded: state.is_degraded(),
        },
    )
    .ok()
}

/// Convert a broadcast receiver into an SSE response, forwarding events until
/// the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    handshake: Option<ServerEvent>,
    kind: StreamKind,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        if let Some(payload) = handshake
            && tx.send(Ok(to_event(payload))).await.is_err()
        {
            return;
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            // Skip lagged messages but keep the stream alive.
                            debug!(?kind, skipped, "SSE subscriber lagged");
                            continue;
                        }
                    }
                }
            }
        }

        info!(?kind, "SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn to_event(payload: ServerEvent) -> Event {
    Event::default().event(payload.name).data(&*payload.data)
}
