use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::{FinishReason, SessionPhase};

/// Publicly visible session phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleSessionPhase {
    /// Waiting for the player to start.
    Idle,
    /// Timed rounds in progress.
    Playing,
    /// Going through the mistakes of the run.
    Review,
    /// Final summary.
    Over,
}

impl From<SessionPhase> for VisibleSessionPhase {
    fn from(value: SessionPhase) -> Self {
        match value {
            SessionPhase::Idle => VisibleSessionPhase::Idle,
            SessionPhase::Playing => VisibleSessionPhase::Playing,
            SessionPhase::Review => VisibleSessionPhase::Review,
            SessionPhase::Over => VisibleSessionPhase::Over,
        }
    }
}

/// Why the timed phase of a run ended.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleFinishReason {
    ClockExpired,
    ManualStop,
}

impl From<FinishReason> for VisibleFinishReason {
    fn from(value: FinishReason) -> Self {
        match value {
            FinishReason::ClockExpired => VisibleFinishReason::ClockExpired,
            FinishReason::ManualStop => VisibleFinishReason::ManualStop,
        }
    }
}
