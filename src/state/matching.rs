//! Matching board for the active round: remaining pool, armed selection and score.

use crate::state::{content::RoundPool, mistakes::MistakeLedger};

/// Points awarded for a correct pairing.
pub const CORRECT_DELTA: i64 = 10;
/// Points removed for an incorrect pairing.
pub const INCORRECT_DELTA: i64 = -5;

/// Outcome of arming a verb or a phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Only one side of the pair is armed; nothing was evaluated.
    Armed,
    /// The armed phrase is not in play (already matched or unknown).
    Ignored,
    /// The armed verb matches the armed phrase.
    Correct {
        /// Phrase removed from the pool.
        phrase: String,
        /// Verb that completed it.
        verb: String,
    },
    /// The armed verb does not match the armed phrase.
    Incorrect {
        /// Phrase that stays armed.
        phrase: String,
        /// Rejected verb.
        verb: String,
        /// Whether this exact wrong attempt was new to the ledger.
        recorded: bool,
    },
}

impl Resolution {
    /// Score change caused by this outcome.
    pub fn score_delta(&self) -> i64 {
        match self {
            Resolution::Correct { .. } => CORRECT_DELTA,
            Resolution::Incorrect { .. } => INCORRECT_DELTA,
            Resolution::Armed | Resolution::Ignored => 0,
        }
    }
}

/// Player state for the current round.
#[derive(Debug, Clone, Default)]
pub struct MatchBoard {
    pool: RoundPool,
    armed_verb: Option<String>,
    armed_phrase: Option<String>,
    score: i64,
}

impl MatchBoard {
    /// Create an empty board with a zero score.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a freshly drawn pool and clear any pending selection.
    pub fn load_pool(&mut self, pool: RoundPool) {
        self.pool = pool;
        self.clear_selection();
    }

    /// Arm a verb; evaluates immediately when a phrase is already armed.
    pub fn arm_verb(&mut self, verb: &str, ledger: &mut MistakeLedger) -> Resolution {
        self.armed_verb = Some(verb.to_owned());
        self.evaluate(ledger)
    }

    /// Arm a phrase; evaluates immediately when a verb is already armed.
    ///
    /// A phrase that is not in the pool is never armed.
    pub fn arm_phrase(&mut self, phrase: &str, ledger: &mut MistakeLedger) -> Resolution {
        if !self.pool.contains(phrase) {
            return Resolution::Ignored;
        }
        self.armed_phrase = Some(phrase.to_owned());
        self.evaluate(ledger)
    }

    fn evaluate(&mut self, ledger: &mut MistakeLedger) -> Resolution {
        let (Some(verb), Some(phrase)) = (self.armed_verb.clone(), self.armed_phrase.clone())
        else {
            return Resolution::Armed;
        };

        let Some(entry) = self.pool.get(&phrase) else {
            self.armed_phrase = None;
            return Resolution::Ignored;
        };

        if entry.correct_verb == verb {
            self.pool.remove(&phrase);
            self.score += CORRECT_DELTA;
            self.clear_selection();
            Resolution::Correct { phrase, verb }
        } else {
            let recorded = ledger.record(entry, &verb);
            self.score += INCORRECT_DELTA;
            self.armed_verb = None;
            Resolution::Incorrect {
                phrase,
                verb,
                recorded,
            }
        }
    }

    /// Drop both armed slots.
    pub fn clear_selection(&mut self) {
        self.armed_verb = None;
        self.armed_phrase = None;
    }

    /// Unmatched entries of the round.
    pub fn pool(&self) -> &RoundPool {
        &self.pool
    }

    /// Whether every entry of the round has been matched.
    pub fn is_clear(&self) -> bool {
        self.pool.is_empty()
    }

    /// Currently armed verb, if any.
    pub fn armed_verb(&self) -> Option<&str> {
        self.armed_verb.as_deref()
    }

    /// Currently armed phrase, if any.
    pub fn armed_phrase(&self) -> Option<&str> {
        self.armed_phrase.as_deref()
    }

    /// Cumulative score of the run.
    pub fn score(&self) -> i64 {
        self.score
    }
}
