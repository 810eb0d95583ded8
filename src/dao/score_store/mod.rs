#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{LeaderboardEntryEntity, ScoreEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over the persistence layer for final scores and the leaderboard.
pub trait ScoreStore: Send + Sync {
    /// Store one finished run.
    fn persist_score(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Offer a score to the leaderboard; the player's best entry is kept.
    fn submit_leaderboard_entry(
        &self,
        entry: LeaderboardEntryEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Best leaderboard entries, highest score first.
    fn fetch_top_entries(
        &self,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<LeaderboardEntryEntity>>>;
    /// Best persisted runs of one player, highest score first.
    fn fetch_top_personal_scores(
        &self,
        user_id: String,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>>;
    /// Cheap round trip proving the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
