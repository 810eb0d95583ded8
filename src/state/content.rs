//! Collocation content and the per-round pool drawn from it.

use indexmap::{IndexMap, IndexSet};
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

/// Immutable content unit: a phrase and the only verb that collocates with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collocation {
    /// The verb that correctly completes the phrase (e.g. "make").
    pub correct_verb: String,
    /// The phrase shown to the player (e.g. "make a decision").
    pub phrase: String,
    /// Short hint displayed next to the phrase card.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Dictionary definition surfaced during review.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    /// Example sentence surfaced during review.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    /// Translation surfaced during review.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

impl Collocation {
    /// Build an entry without any review metadata.
    pub fn new(correct_verb: impl Into<String>, phrase: impl Into<String>) -> Self {
        Self {
            correct_verb: correct_verb.into(),
            phrase: phrase.into(),
            hint: None,
            definition: None,
            example: None,
            translation: None,
        }
    }

    /// Attach a hint to the entry.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// The full set of entries rounds are drawn from.
#[derive(Debug, Clone, Default)]
pub struct ContentBank {
    entries: Vec<Collocation>,
    verbs: Vec<String>,
}

impl ContentBank {
    /// Wrap a list of entries, computing the verb choices in first-seen order.
    pub fn new(entries: Vec<Collocation>) -> Self {
        let verbs = entries
            .iter()
            .map(|entry| entry.correct_verb.clone())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect();
        Self { entries, verbs }
    }

    /// Every entry in the bank, duplicates included.
    pub fn entries(&self) -> &[Collocation] {
        &self.entries
    }

    /// Distinct verbs offered as choices to the player.
    pub fn verbs(&self) -> &[String] {
        &self.verbs
    }

    /// Number of distinct phrases available, which caps the size of any round.
    pub fn unique_phrases(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| entry.phrase.as_str())
            .collect::<IndexSet<_>>()
            .len()
    }

    /// Draw a shuffled round pool of at most `size` entries with unique phrases.
    pub fn draw<R: Rng + ?Sized>(&self, size: usize, rng: &mut R) -> RoundPool {
        draw(&self.entries, size, rng)
    }
}

/// Unmatched entries of the active round, keyed by phrase in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundPool {
    entries: IndexMap<String, Collocation>,
}

impl RoundPool {
    /// Look up the entry for a phrase still in play.
    pub fn get(&self, phrase: &str) -> Option<&Collocation> {
        self.entries.get(phrase)
    }

    /// Whether the phrase is still unmatched.
    pub fn contains(&self, phrase: &str) -> bool {
        self.entries.contains_key(phrase)
    }

    /// Remove a matched phrase, keeping the order of the remaining cards.
    pub fn remove(&mut self, phrase: &str) -> Option<Collocation> {
        self.entries.shift_remove(phrase)
    }

    /// Number of unmatched entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the round has been cleared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the remaining entries in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Collocation> {
        self.entries.values()
    }
}

impl FromIterator<Collocation> for RoundPool {
    /// Collect entries, keeping the first occurrence of each phrase.
    fn from_iter<I: IntoIterator<Item = Collocation>>(iter: I) -> Self {
        let mut entries = IndexMap::new();
        for entry in iter {
            entries.entry(entry.phrase.clone()).or_insert(entry);
        }
        Self { entries }
    }
}

/// Shuffle `bank`, drop repeated phrases and keep the first `size` entries.
///
/// A bank holding fewer unique phrases than `size` yields a shorter pool.
pub fn draw<R: Rng + ?Sized>(bank: &[Collocation], size: usize, rng: &mut R) -> RoundPool {
    let mut shuffled: Vec<&Collocation> = bank.iter().collect();
    shuffled.shuffle(rng);

    let mut entries = IndexMap::with_capacity(size.min(shuffled.len()));
    for entry in shuffled {
        if entries.len() == size {
            break;
        }
        if !entries.contains_key(&entry.phrase) {
            entries.insert(entry.phrase.clone(), entry.clone());
        }
    }

    RoundPool { entries }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn five_entries() -> Vec<Collocation> {
        vec![
            Collocation::new("make", "make a decision"),
            Collocation::new("take", "take a break"),
            Collocation::new("do", "do homework"),
            Collocation::new("have", "have a shower"),
            Collocation::new("catch", "catch a cold"),
        ]
    }

    #[test]
    fn draws_every_entry_when_size_matches_bank() {
        let bank = five_entries();
        let mut rng = StdRng::seed_from_u64(7);

        let pool = draw(&bank, 5, &mut rng);

        assert_eq!(pool.len(), 5);
        let phrases: HashSet<_> = pool.iter().map(|e| e.phrase.clone()).collect();
        let expected: HashSet<_> = bank.iter().map(|e| e.phrase.clone()).collect();
        assert_eq!(phrases, expected);
    }

    #[test]
    fn repeated_phrases_are_drawn_once() {
        let mut bank = five_entries();
        bank.push(Collocation::new("make", "make a decision"));
        bank.push(Collocation::new("take", "take a break"));

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let pool = draw(&bank, 10, &mut rng);
            assert_eq!(pool.len(), 5, "seed {seed}");
        }
    }

    #[test]
    fn short_bank_degrades_to_smaller_pool() {
        let bank = five_entries();
        let mut rng = StdRng::seed_from_u64(1);

        let pool = draw(&bank[..3], 8, &mut rng);

        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn pool_is_capped_at_requested_size() {
        let bank = five_entries();
        let mut rng = StdRng::seed_from_u64(3);

        assert_eq!(draw(&bank, 2, &mut rng).len(), 2);
        assert!(draw(&bank, 0, &mut rng).is_empty());
    }

    #[test]
    fn removal_keeps_remaining_order() {
        let mut pool: RoundPool = five_entries().into_iter().collect();

        pool.remove("do homework");

        let phrases: Vec<_> = pool.iter().map(|e| e.phrase.as_str()).collect();
        assert_eq!(
            phrases,
            vec!["make a decision", "take a break", "have a shower", "catch a cold"]
        );
        assert!(pool.remove("do homework").is_none());
    }

    #[test]
    fn bank_lists_distinct_verbs_in_first_seen_order() {
        let mut entries = five_entries();
        entries.push(Collocation::new("make", "make progress"));
        let bank = ContentBank::new(entries);

        assert_eq!(bank.verbs(), ["make", "take", "do", "have", "catch"]);
        assert_eq!(bank.unique_phrases(), 6);
    }
}
