use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::state::{SharedState, state_machine::SessionPhase};

const MIN_SWEEP_PERIOD: Duration = Duration::from_secs(1);
const MAX_SWEEP_PERIOD: Duration = Duration::from_secs(60);

/// Periodically evict sessions idle for longer than the configured TTL.
///
/// Returns immediately when the TTL is zero; otherwise never returns.
pub async fn run(state: SharedState) {
    let ttl = state.config().session_ttl;
    if ttl.is_zero() {
        info!("session eviction disabled");
        return;
    }

    let mut ticker = interval((ttl / 4).clamp(MIN_SWEEP_PERIOD, MAX_SWEEP_PERIOD));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        evict_idle(&state).await;
    }
}

/// Drop every session idle past the TTL and return how many went.
///
/// A run still in play is kept until its clock ends it, so it is scored.
pub async fn evict_idle(state: &SharedState) -> usize {
    let ttl = state.config().session_ttl;
    if ttl.is_zero() {
        return 0;
    }

    let mut evicted = 0;
    for (session_id, handle) in state.session_handles() {
        let mut slot = handle.slot().lock().await;
        if slot.session.phase() == SessionPhase::Playing || slot.idle_for() < ttl {
            continue;
        }
        if state.remove_session(session_id).is_some() {
            slot.driver = None;
            evicted += 1;
            debug!(%session_id, phase = ?slot.session.phase(), "evicted idle session");
        }
    }

    if evicted > 0 {
        info!(evicted, remaining = state.session_count(), "idle sessions evicted");
    }
    evicted
}
