use serde::Serialize;
use utoipa::ToSchema;

/// Overall service state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Scores are being persisted.
    Ok,
    /// Sessions run but finished scores are dropped.
    Degraded,
}

/// Body of `GET /healthcheck`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Degraded while the score store is unavailable.
    pub status: HealthStatus,
    /// Sessions currently held in memory.
    pub active_sessions: usize,
    /// Result of the score store ping made for this request.
    pub store_reachable: bool,
}
