use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{LeaderboardEntryEntity, ScoreEntity},
    dto::format_system_time,
};

/// Optional `limit` query parameter shared by ranking endpoints.
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct LimitQuery {
    /// Number of rows to return (1-100); defaults to the configured size.
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<usize>,
}

/// One row of the global leaderboard.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct LeaderboardEntryView {
    /// 1-based position.
    pub rank: usize,
    pub user_id: String,
    pub display_name: String,
    pub score: i64,
    /// RFC 3339 timestamp of the best run.
    pub recorded_at: String,
}

impl LeaderboardEntryView {
    /// Number entries in the order they were fetched.
    pub fn ranked(entries: Vec<LeaderboardEntryEntity>) -> Vec<Self> {
        entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| Self {
                rank: index + 1,
                user_id: entry.user_id,
                display_name: entry.display_name,
                score: entry.score,
                recorded_at: format_system_time(entry.recorded_at),
            })
            .collect()
    }
}

/// Response of `GET /leaderboard`.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntryView>,
}

/// A persisted run of one player.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PersonalScoreView {
    pub score: i64,
    pub session_id: Uuid,
    pub run: u32,
    /// RFC 3339 timestamp of the run's end.
    pub recorded_at: String,
}

impl From<ScoreEntity> for PersonalScoreView {
    fn from(value: ScoreEntity) -> Self {
        Self {
            score: value.score,
            session_id: value.session_id,
            run: value.run,
            recorded_at: format_system_time(value.recorded_at),
        }
    }
}

/// Response of `GET /players/{id}/best`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PersonalBestResponse {
    pub user_id: String,
    pub scores: Vec<PersonalScoreView>,
}
