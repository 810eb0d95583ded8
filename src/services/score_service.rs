use std::time::SystemTime;

use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::{LeaderboardEntryEntity, ScoreEntity},
        storage::StorageResult,
    },
    services::sse_events,
    state::{SharedState, session::ScoreSubmission},
};

/// Run [`record`] on its own task so it completes even when the caller is dropped.
///
/// Awaiting the handle is optional; the caller only loses the wait, never the write.
pub fn spawn_record(state: &SharedState, submission: ScoreSubmission) -> JoinHandle<()> {
    let state = state.clone();
    tokio::spawn(async move { record(&state, submission).await })
}

/// Persist a finished run and offer it to the leaderboard.
///
/// Failures are logged and swallowed: a run that could not be stored is
/// never retried and never surfaces to the player.
pub async fn record(state: &SharedState, submission: ScoreSubmission) {
    let store = match state.require_score_store().await {
        Ok(store) => store,
        Err(err) => {
            warn!(
                session_id = %submission.session_id,
                run = submission.run,
                error = %err,
                "dropping final score; no score store available"
            );
            return;
        }
    };

    let recorded_at = SystemTime::now();
    let score = ScoreEntity {
        id: Uuid::new_v4(),
        user_id: submission.player.id.clone(),
        session_id: submission.session_id,
        run: submission.run,
        score: submission.score,
        recorded_at,
    };
    let entry = LeaderboardEntryEntity {
        user_id: submission.player.id,
        display_name: submission.player.display_name,
        score: submission.score,
        recorded_at,
    };

    let outcome: StorageResult<Vec<LeaderboardEntryEntity>> = async {
        store.persist_score(score).await?;
        store.submit_leaderboard_entry(entry).await?;
        store
            .fetch_top_entries(state.config().leaderboard_size)
            .await
    }
    .await;

    match outcome {
        Ok(entries) => {
            info!(
                session_id = %submission.session_id,
                run = submission.run,
                score = submission.score,
                "final score recorded"
            );
            sse_events::broadcast_leaderboard_updated(state, entries);
        }
        Err(err) => warn!(
            session_id = %submission.session_id,
            run = submission.run,
            error = %err,
            "failed to record final score"
        ),
    }
}
