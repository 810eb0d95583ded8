use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod health;
pub mod leaderboard;
pub mod sessions;
pub mod sse;

/// Every HTTP route of the service, bound to `state`.
pub fn router(state: SharedState) -> Router<()> {
    Router::new()
        .merge(sessions::router())
        .merge(leaderboard::router())
        .merge(sse::router())
        .merge(health::router())
        .merge(docs::router())
        .with_state(state)
}
