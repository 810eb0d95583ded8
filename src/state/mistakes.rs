//! Mistakes made during play and their deduplication into a review queue.

use indexmap::{IndexMap, map::Entry};

use crate::state::content::Collocation;

/// One incorrect verb tried against a phrase during play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MistakeRecord {
    /// The phrase the player was matching.
    pub phrase: String,
    /// The wrong verb the player picked.
    pub selected_verb: String,
    /// The verb that collocates with the phrase.
    pub correct_verb: String,
    /// Content entry the mistake was made against, carried for review.
    pub entry: Collocation,
}

/// Ordered record of a run's incorrect submissions.
///
/// Records are keyed by `(phrase, selected_verb)`: repeating the same wrong
/// attempt is absorbed, a different wrong verb on the same phrase is kept.
#[derive(Debug, Clone, Default)]
pub struct MistakeLedger {
    records: IndexMap<(String, String), MistakeRecord>,
}

impl MistakeLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a wrong attempt against `entry`; returns `false` if it was already known.
    pub fn record(&mut self, entry: &Collocation, selected_verb: &str) -> bool {
        let key = (entry.phrase.clone(), selected_verb.to_owned());
        match self.records.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(MistakeRecord {
                    phrase: entry.phrase.clone(),
                    selected_verb: selected_verb.to_owned(),
                    correct_verb: entry.correct_verb.clone(),
                    entry: entry.clone(),
                });
                true
            }
        }
    }

    /// Number of distinct wrong attempts recorded.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the run is mistake-free so far.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in the order they were first made.
    pub fn records(&self) -> impl Iterator<Item = &MistakeRecord> {
        self.records.values()
    }

    /// Reduce the ledger to one record per `(correct_verb, phrase)`.
    ///
    /// The first record seen for a key wins and the queue keeps first-seen
    /// order, so later wrong verbs on an already-queued phrase are not surfaced.
    pub fn dedup_for_review(&self) -> Vec<MistakeRecord> {
        let mut queue: IndexMap<(&str, &str), &MistakeRecord> = IndexMap::new();
        for record in self.records.values() {
            queue
                .entry((record.correct_verb.as_str(), record.phrase.as_str()))
                .or_insert(record);
        }
        queue.into_values().cloned().collect()
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
