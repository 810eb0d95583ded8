use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::dao::models::{LeaderboardEntryEntity, ScoreEntity};

pub const SCORE_PREFIX: &str = "score::";
pub const LEADERBOARD_PREFIX: &str = "leaderboard::";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Score documents are immutable, so they never carry a revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchScoreDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub score: ScoreBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBody {
    pub score_id: Uuid,
    pub user_id: String,
    pub session_id: Uuid,
    pub run: u32,
    pub score: i64,
    pub recorded_at: SystemTime,
}

impl From<ScoreEntity> for CouchScoreDocument {
    fn from(value: ScoreEntity) -> Self {
        Self {
            id: score_doc_id(&value.user_id, value.id),
            score: ScoreBody {
                score_id: value.id,
                user_id: value.user_id,
                session_id: value.session_id,
                run: value.run,
                score: value.score,
                recorded_at: value.recorded_at,
            },
        }
    }
}

impl From<CouchScoreDocument> for ScoreEntity {
    fn from(doc: CouchScoreDocument) -> Self {
        Self {
            id: doc.score.score_id,
            user_id: doc.score.user_id,
            session_id: doc.score.session_id,
            run: doc.score.run,
            score: doc.score.score,
            recorded_at: doc.score.recorded_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchLeaderboardDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub entry: LeaderboardBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardBody {
    pub user_id: String,
    pub display_name: String,
    pub score: i64,
    pub recorded_at: SystemTime,
}

impl From<(LeaderboardEntryEntity, Option<String>)> for CouchLeaderboardDocument {
    fn from((entry, rev): (LeaderboardEntryEntity, Option<String>)) -> Self {
        Self {
            id: leaderboard_doc_id(&entry.user_id),
            rev,
            entry: LeaderboardBody {
                user_id: entry.user_id,
                display_name: entry.display_name,
                score: entry.score,
                recorded_at: entry.recorded_at,
            },
        }
    }
}

impl From<CouchLeaderboardDocument> for LeaderboardEntryEntity {
    fn from(doc: CouchLeaderboardDocument) -> Self {
        Self {
            user_id: doc.entry.user_id,
            display_name: doc.entry.display_name,
            score: doc.entry.score,
            recorded_at: doc.entry.recorded_at,
        }
    }
}

/// Scores are grouped by user so one player's runs form a contiguous key range.
pub fn score_doc_id(user_id: &str, score_id: Uuid) -> String {
    format!("{}{}", score_user_prefix(user_id), score_id)
}

pub fn score_user_prefix(user_id: &str) -> String {
    format!("{}{}::", SCORE_PREFIX, user_id)
}

pub fn leaderboard_doc_id(user_id: &str) -> String {
    format!("{}{}", LEADERBOARD_PREFIX, user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_ids_share_the_user_prefix() {
        let id = Uuid::new_v4();
        let doc_id = score_doc_id("user-1", id);

        assert!(doc_id.starts_with(&score_user_prefix("user-1")));
        assert!(doc_id.starts_with(SCORE_PREFIX));
        assert!(doc_id.ends_with(&id.to_string()));
    }

    #[test]
    fn leaderboard_document_keeps_its_revision() {
        let entry = LeaderboardEntryEntity {
            user_id: "user-1".into(),
            display_name: "Ana".into(),
            score: 40,
            recorded_at: SystemTime::UNIX_EPOCH,
        };

        let doc: CouchLeaderboardDocument = (entry.clone(), Some("3-abc".into())).into();
        let json = serde_json::to_value(&doc).unwrap();

        assert_eq!(json["_id"], "leaderboard::user-1");
        assert_eq!(json["_rev"], "3-abc");
        assert_eq!(json["score"], 40);
        assert_eq!(LeaderboardEntryEntity::from(doc), entry);
    }
}
