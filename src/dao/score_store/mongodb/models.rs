use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{LeaderboardEntryEntity, ScoreEntity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoScoreDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    user_id: String,
    session_id: Uuid,
    run: u32,
    score: i64,
    recorded_at: DateTime,
}

impl From<ScoreEntity> for MongoScoreDocument {
    fn from(value: ScoreEntity) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            session_id: value.session_id,
            run: value.run,
            score: value.score,
            recorded_at: DateTime::from_system_time(value.recorded_at),
        }
    }
}

impl From<MongoScoreDocument> for ScoreEntity {
    fn from(value: MongoScoreDocument) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            session_id: value.session_id,
            run: value.run,
            score: value.score,
            recorded_at: value.recorded_at.to_system_time(),
        }
    }
}

/// Leaderboard entries are keyed by user so each player holds one row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoLeaderboardDocument {
    #[serde(rename = "_id")]
    user_id: String,
    display_name: String,
    score: i64,
    recorded_at: DateTime,
}

impl From<LeaderboardEntryEntity> for MongoLeaderboardDocument {
    fn from(value: LeaderboardEntryEntity) -> Self {
        Self {
            user_id: value.user_id,
            display_name: value.display_name,
            score: value.score,
            recorded_at: DateTime::from_system_time(value.recorded_at),
        }
    }
}

impl From<MongoLeaderboardDocument> for LeaderboardEntryEntity {
    fn from(value: MongoLeaderboardDocument) -> Self {
        Self {
            user_id: value.user_id,
            display_name: value.display_name,
            score: value.score,
            recorded_at: value.recorded_at.to_system_time(),
        }
    }
}

pub fn doc_id(id: &str) -> Document {
    doc! {"_id": id}
}

/// Score descending, earliest record first on ties.
pub fn ranking_sort() -> Document {
    doc! {"score": -1, "recorded_at": 1}
}
