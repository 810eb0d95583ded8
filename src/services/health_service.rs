use tracing::warn;

use crate::{
    dto::health::{HealthResponse, HealthStatus},
    state::SharedState,
};

/// Ping the score store and report the service state.
///
/// The status follows the supervisor's degraded flag; a failed ping here is
/// only logged and surfaced through `store_reachable`.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let store_reachable = match state.require_score_store().await {
        Ok(store) => match store.health_check().await {
            Ok(()) => true,
            Err(err) => {
                warn!(backend = err.backend(), error = %err, "score store ping failed");
                false
            }
        },
        Err(_) => false,
    };

    HealthResponse {
        status: if state.is_degraded() {
            HealthStatus::Degraded
        } else {
            HealthStatus::Ok
        },
        active_sessions: state.session_count(),
        store_reachable,
    }
}
