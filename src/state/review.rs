use thiserror::Error;

use crate::state::mistakes::MistakeRecord;

/// Reasons a review answer is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReviewError {
    /// Every item has been reviewed or the review was skipped.
    #[error("review queue is exhausted")]
    Finished,
    /// The current item was already answered and awaits advancing.
    #[error("review item {index} was already answered")]
    AlreadyAnswered {
        /// Index of the answered item.
        index: usize,
    },
    /// The current item has not been answered yet.
    #[error("review item {index} has not been answered")]
    Unanswered {
        /// Index of the pending item.
        index: usize,
    },
}

/// Verdict for one review answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewVerdict {
    /// Index of the item that was answered.
    pub index: usize,
    /// Whether the chosen verb was right.
    pub correct: bool,
    /// The verb that collocates with the phrase.
    pub correct_verb: String,
}

/// Walks the deduplicated mistake queue one item at a time.
///
/// Each item is answered once and then advanced once, either by the feedback
/// timer or by the player.
#[derive(Debug, Clone)]
pub struct ReviewSequencer {
    queue: Vec<MistakeRecord>,
    index: usize,
    review_score: u32,
    last_verdict: Option<ReviewVerdict>,
}

impl ReviewSequencer {
    /// Start reviewing `queue` from its first item.
    pub fn new(queue: Vec<MistakeRecord>) -> Self {
        Self {
            queue,
            index: 0,
            review_score: 0,
            last_verdict: None,
        }
    }

    /// Item awaiting an answer or an advance.
    pub fn current(&self) -> Option<&MistakeRecord> {
        self.queue.get(self.index)
    }

    /// Answer the current item.
    pub fn answer(&mut self, chosen_verb: &str) -> Result<ReviewVerdict, ReviewError> {
        let Some(item) = self.queue.get(self.index) else {
            return Err(ReviewError::Finished);
        };
        if self.is_answered() {
            return Err(ReviewError::AlreadyAnswered { index: self.index });
        }

        let correct = item.correct_verb == chosen_verb;
        if correct {
            self.review_score += 1;
        }

        let verdict = ReviewVerdict {
            index: self.index,
            correct,
            correct_verb: item.correct_verb.clone(),
        };
        self.last_verdict = Some(verdict.clone());
        Ok(verdict)
    }

    /// Move past the item at `expected_index` once it has been answered.
    ///
    /// Returns `false` when the item is unanswered or the sequencer already
    /// moved on, so a late feedback timer never skips a fresh item.
    pub fn advance(&mut self, expected_index: usize) -> bool {
        if self.index != expected_index || !self.is_answered() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Jump to the end without scoring the remaining items.
    pub fn skip(&mut self) {
        self.index = self.queue.len();
    }

    /// Whether the current item has a verdict pending advance.
    pub fn is_answered(&self) -> bool {
        self.last_verdict
            .as_ref()
            .is_some_and(|verdict| verdict.index == self.index)
    }

    /// Whether the sequencer reached its terminal index.
    pub fn is_finished(&self) -> bool {
        self.index >= self.queue.len()
    }

    /// Position in the queue.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of items to review.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the queue holds no item at all.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Correct review answers so far.
    pub fn review_score(&self) -> u32 {
        self.review_score
    }

    /// Verdict of the current item, if answered.
    pub fn pending_verdict(&self) -> Option<&ReviewVerdict> {
        self.last_verdict
            .as_ref()
            .filter(|verdict| verdict.index == self.index)
    }
}
