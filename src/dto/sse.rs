use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use crate::{dto::leaderboard::LeaderboardEntryView, state::cues::Cue};

/// A named SSE event with its JSON payload, shared by every subscriber.
#[derive(Clone, Debug)]
pub struct ServerEvent {
    pub name: &'static str,
    pub data: Arc<str>,
}

impl ServerEvent {
    /// Serialize `payload` under the event `name`.
    pub fn json<T: Serialize>(name: &'static str, payload: &T) -> serde_json::Result<Self> {
        let data = serde_json::to_string(payload)?;
        Ok(Self {
            name,
            data: data.into(),
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the SSE stream (`session` or `leaderboard`).
    pub stream: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a score store.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Audio cue emitted by a session operation or clock tick.
pub struct CueEvent {
    #[schema(value_type = String, example = "tickFast")]
    pub cue: Cue,
    /// Seconds left on the round clock when the cue was produced.
    pub remaining_secs: u32,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast after a score reached the leaderboard.
pub struct LeaderboardUpdatedEvent {
    pub entries: Vec<LeaderboardEntryView>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}
