use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::dao::{
    models::{LeaderboardEntryEntity, ScoreEntity, rank_by_score},
    score_store::ScoreStore,
    storage::StorageResult,
};

#[derive(Default)]
struct MemoryInner {
    scores: Vec<ScoreEntity>,
    leaderboard: Vec<LeaderboardEntryEntity>,
}

/// Process-local [`ScoreStore`], lost on restart.
#[derive(Clone, Default)]
pub struct MemoryScoreStore {
    inner: Arc<RwLock<MemoryInner>>,
}

impl MemoryScoreStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn persist_score(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.write().await.scores.push(score);
            Ok(())
        })
    }

    fn submit_leaderboard_entry(
        &self,
        entry: LeaderboardEntryEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.write().await;
            let leaderboard = &mut guard.leaderboard;
            match leaderboard
                .iter_mut()
                .find(|existing| existing.user_id == entry.user_id)
            {
                Some(existing) if existing.is_beaten_by(&entry) => *existing = entry,
                Some(existing) => existing.display_name = entry.display_name,
                None => leaderboard.push(entry),
            }
            Ok(())
        })
    }

    fn fetch_top_entries(
        &self,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<LeaderboardEntryEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut entries = inner.read().await.leaderboard.clone();
            rank_by_score(&mut entries, |e| (e.score, e.recorded_at));
            entries.truncate(limit);
            Ok(entries)
        })
    }

    fn fetch_top_personal_scores(
        &self,
        user_id: String,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut scores: Vec<ScoreEntity> = inner
                .read()
                .await
                .scores
                .iter()
                .filter(|score| score.user_id == user_id)
                .cloned()
                .collect();
            rank_by_score(&mut scores, |s| (s.score, s.recorded_at));
            scores.truncate(limit);
            Ok(scores)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use uuid::Uuid;

    use super::*;

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn score(user_id: &str, score: i64, secs: u64) -> ScoreEntity {
        ScoreEntity {
            id: Uuid::new_v4(),
            user_id: user_id.to_owned(),
            session_id: Uuid::new_v4(),
            run: 1,
            score,
            recorded_at: at(secs),
        }
    }

    fn entry(user_id: &str, name: &str, score: i64, secs: u64) -> LeaderboardEntryEntity {
        LeaderboardEntryEntity {
            user_id: user_id.to_owned(),
            display_name: name.to_owned(),
            score,
            recorded_at: at(secs),
        }
    }

    #[tokio::test]
    async fn leaderboard_keeps_each_players_best() {
        let store = MemoryScoreStore::new();
        store.submit_leaderboard_entry(entry("u1", "Ana", 30, 1)).await.unwrap();
        store.submit_leaderboard_entry(entry("u2", "Ben", 50, 2)).await.unwrap();
        store.submit_leaderboard_entry(entry("u1", "Ana", 20, 3)).await.unwrap();
        store.submit_leaderboard_entry(entry("u1", "Ana B.", 70, 4)).await.unwrap();

        let top = store.fetch_top_entries(10).await.unwrap();

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].display_name, "Ana B.");
        assert_eq!(top[0].score, 70);
        assert_eq!(top[1].user_id, "u2");
    }

    #[tokio::test]
    async fn top_entries_respect_limit() {
        let store = MemoryScoreStore::new();
        for (index, points) in [10, 40, 30].into_iter().enumerate() {
            let id = format!("u{index}");
            store
                .submit_leaderboard_entry(entry(&id, &id, points, index as u64))
                .await
                .unwrap();
        }

        let top = store.fetch_top_entries(2).await.unwrap();

        let scores: Vec<_> = top.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![40, 30]);
    }

    #[tokio::test]
    async fn personal_scores_are_filtered_and_ranked() {
        let store = MemoryScoreStore::new();
        store.persist_score(score("u1", 20, 1)).await.unwrap();
        store.persist_score(score("u2", 90, 2)).await.unwrap();
        store.persist_score(score("u1", 45, 3)).await.unwrap();
        store.persist_score(score("u1", -5, 4)).await.unwrap();

        let best = store
            .fetch_top_personal_scores("u1".into(), 2)
            .await
            .unwrap();

        let scores: Vec<_> = best.iter().map(|s| s.score).collect();
        assert_eq!(scores, vec![45, 20]);
    }
}
