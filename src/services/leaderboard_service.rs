use tracing::warn;

use crate::{
    dto::leaderboard::{
        LeaderboardEntryView, LeaderboardResponse, PersonalBestResponse, PersonalScoreView,
    },
    error::ServiceError,
    state::SharedState,
};

/// Global leaderboard, `limit` rows or the configured size.
pub async fn top_entries(
    state: &SharedState,
    limit: Option<usize>,
) -> Result<LeaderboardResponse, ServiceError> {
    let store = state.require_score_store().await?;
    let limit = limit.unwrap_or(state.config().leaderboard_size);
    let entries = store.fetch_top_entries(limit).await?;
    Ok(LeaderboardResponse {
        entries: LeaderboardEntryView::ranked(entries),
    })
}

/// Best persisted runs of one player.
pub async fn personal_best(
    state: &SharedState,
    user_id: String,
    limit: Option<usize>,
) -> Result<PersonalBestResponse, ServiceError> {
    let store = state.require_score_store().await?;
    let limit = limit.unwrap_or(state.config().personal_best_count);
    let scores = store.fetch_top_personal_scores(user_id.clone(), limit).await?;
    Ok(PersonalBestResponse {
        user_id,
        scores: scores.into_iter().map(PersonalScoreView::from).collect(),
    })
}

/// Personal bests for the summary screen; empty when they cannot be loaded.
pub async fn personal_best_or_empty(state: &SharedState, user_id: &str) -> Vec<PersonalScoreView> {
    match personal_best(state, user_id.to_string(), None).await {
        Ok(response) => response.scores,
        Err(err) => {
            warn!(user_id, error = %err, "personal bests unavailable for summary");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::Arc,
        time::{Duration, SystemTime},
    };

    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{LeaderboardEntryEntity, ScoreEntity},
            score_store::{ScoreStore, memory::MemoryScoreStore},
        },
        state::AppState,
    };

    async fn state_with_scores() -> SharedState {
        let state = AppState::new(AppConfig::default());
        let store = MemoryScoreStore::new();
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        for (user, score) in [("ana", 4), ("ben", 9), ("ana", 7)] {
            store
                .persist_score(ScoreEntity {
                    id: Uuid::new_v4(),
                    user_id: user.into(),
                    session_id: Uuid::new_v4(),
                    run: 1,
                    score,
                    recorded_at: base,
                })
                .await
                .unwrap();
            store
                .submit_leaderboard_entry(LeaderboardEntryEntity {
                    user_id: user.into(),
                    display_name: user.to_uppercase(),
                    score,
                    recorded_at: base,
                })
                .await
                .unwrap();
        }
        state.set_score_store(Arc::new(store)).await;
        state
    }

    #[tokio::test]
    async fn leaderboard_is_ranked_and_limited() {
        let state = state_with_scores().await;

        let response = top_entries(&state, Some(1)).await.unwrap();

        assert_eq!(response.entries.len(), 1);
        assert_eq!(response.entries[0].user_id, "ben");
        assert_eq!(response.entries[0].rank, 1);
    }

    #[tokio::test]
    async fn personal_bests_come_highest_first() {
        let state = state_with_scores().await;

        let response = personal_best(&state, "ana".into(), None).await.unwrap();
        let scores: Vec<i64> = response.scores.iter().map(|s| s.score).collect();

        assert_eq!(scores, vec![7, 4]);
    }

    #[tokio::test]
    async fn degraded_mode_refuses_reads() {
        let state = AppState::new(AppConfig::default());

        let err = top_entries(&state, None).await.unwrap_err();

        assert!(matches!(err, ServiceError::Degraded));
        assert!(personal_best_or_empty(&state, "ana").await.is_empty());
    }
}
