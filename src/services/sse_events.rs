use serde::Serialize;
use tracing::{trace, warn};

use crate::{
    dao::models::LeaderboardEntryEntity,
    dto::{
        leaderboard::LeaderboardEntryView,
        session::SessionView,
        sse::{CueEvent, LeaderboardUpdatedEvent, ServerEvent, SystemStatus},
    },
    state::{SessionHandle, SharedState, SseHub, cues::Cue},
};

const EVENT_CUE: &str = "cue";
const EVENT_SESSION: &str = "session";
const EVENT_LEADERBOARD_UPDATED: &str = "leaderboard.updated";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Broadcast each cue of an operation, in order, to the session's subscribers.
pub fn broadcast_cues(handle: &SessionHandle, cues: &[Cue], remaining_secs: u32) {
    for cue in cues {
        let payload = CueEvent {
            cue: *cue,
            remaining_secs,
        };
        send_event(handle.events(), EVENT_CUE, &payload);
    }
}

/// Broadcast a fresh snapshot of the session.
pub fn broadcast_session(handle: &SessionHandle, view: &SessionView) {
    send_event(handle.events(), EVENT_SESSION, view);
}

/// Broadcast the refreshed leaderboard after a score was recorded.
pub fn broadcast_leaderboard_updated(state: &SharedState, entries: Vec<LeaderboardEntryEntity>) {
    let payload = LeaderboardUpdatedEvent {
        entries: LeaderboardEntryView::ranked(entries),
    };
    send_event(state.leaderboard_sse(), EVENT_LEADERBOARD_UPDATED, &payload);
}

/// Tell leaderboard subscribers whether scores can currently be read or written.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    send_event(
        state.leaderboard_sse(),
        EVENT_SYSTEM_STATUS,
        &SystemStatus { degraded },
    );
}

fn send_event(hub: &SseHub, name: &'static str, payload: &impl Serialize) {
    match ServerEvent::json(name, payload) {
        Ok(event) => {
            let delivered = hub.broadcast(event);
            trace!(event = name, delivered, "SSE event sent");
        }
        Err(err) => warn!(event = name, error = %err, "failed to serialize SSE payload"),
    }
}
