//! Persistence of finished runs and the leaderboard.

/// Backend-neutral score and leaderboard records.
pub mod models;
/// The [`score_store::ScoreStore`] trait and its backends.
pub mod score_store;
/// Errors shared by every backend.
pub mod storage;
