use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// One finished run persisted for a signed-in player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreEntity {
    /// Stable identifier for the record.
    pub id: Uuid,
    /// Player the score belongs to.
    pub user_id: String,
    /// Session that produced the score.
    pub session_id: Uuid,
    /// Run of the session that produced the score.
    pub run: u32,
    /// Final score of the timed phase.
    pub score: i64,
    /// When the run ended.
    pub recorded_at: SystemTime,
}

/// Best score of a player, shown on the global leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntryEntity {
    /// Player the entry belongs to.
    pub user_id: String,
    /// Name shown on the leaderboard.
    pub display_name: String,
    /// Best score submitted so far.
    pub score: i64,
    /// When the best score was submitted.
    pub recorded_at: SystemTime,
}

impl LeaderboardEntryEntity {
    /// Whether `candidate` should replace this entry.
    ///
    /// Only a strictly higher score wins so ties keep the earliest record.
    pub fn is_beaten_by(&self, candidate: &LeaderboardEntryEntity) -> bool {
        candidate.score > self.score
    }
}

/// Order records by score descending, ties by earliest record first.
pub fn rank_by_score<T>(items: &mut [T], key: impl Fn(&T) -> (i64, SystemTime)) {
    items.sort_by(|a, b| {
        let (score_a, at_a) = key(a);
        let (score_b, at_b) = key(b);
        score_b.cmp(&score_a).then(at_a.cmp(&at_b))
    });
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn entry(name: &str, score: i64, offset_secs: u64) -> LeaderboardEntryEntity {
        LeaderboardEntryEntity {
            user_id: name.to_owned(),
            display_name: name.to_owned(),
            score,
            recorded_at: SystemTime::UNIX_EPOCH + Duration::from_secs(offset_secs),
        }
    }

    #[test]
    fn ranking_breaks_ties_by_earliest_record() {
        let mut entries = vec![
            entry("late", 40, 20),
            entry("top", 90, 30),
            entry("early", 40, 10),
        ];

        rank_by_score(&mut entries, |e| (e.score, e.recorded_at));

        let names: Vec<_> = entries.iter().map(|e| e.user_id.as_str()).collect();
        assert_eq!(names, vec!["top", "early", "late"]);
    }

    #[test]
    fn only_a_higher_score_replaces_an_entry() {
        let current = entry("ana", 40, 10);
        assert!(!current.is_beaten_by(&entry("ana", 40, 20)));
        assert!(!current.is_beaten_by(&entry("ana", 35, 20)));
        assert!(current.is_beaten_by(&entry("ana", 45, 20)));
    }
}
