//! Session aggregate: lifecycle, round progression and the one-shot score gate.
//!
//! Every mutation goes through a named method on [`Session`]. Methods return
//! the side effects the caller must carry out (audio cues, score submission)
//! instead of performing them, which keeps the aggregate synchronous.

use std::sync::Arc;

use rand::{SeedableRng, rngs::StdRng};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::state::{
    clock::{ClockSchedule, ClockTick, RoundClock},
    content::ContentBank,
    cues::Cue,
    matching::{MatchBoard, Resolution},
    mistakes::MistakeLedger,
    review::{ReviewError, ReviewSequencer, ReviewVerdict},
    state_machine::{
        FinishReason, InvalidTransition, SessionEvent, SessionPhase, SessionStateMachine,
    },
};

/// Gameplay knobs shared by every session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameTuning {
    /// Number of phrases drawn per round.
    pub round_size: usize,
    /// Round duration schedule.
    pub schedule: ClockSchedule,
    /// Remaining seconds at or under which ticks become fast ticks.
    pub fast_threshold_secs: u32,
}

impl Default for GameTuning {
    fn default() -> Self {
        Self {
            round_size: 5,
            schedule: ClockSchedule::default(),
            fast_threshold_secs: 5,
        }
    }
}

/// Identity of a signed-in player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerIdentity {
    /// Stable user identifier.
    pub id: String,
    /// Name shown on the leaderboard.
    pub display_name: String,
}

/// Final score to hand to the persistence collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreSubmission {
    /// Session the score belongs to.
    pub session_id: Uuid,
    /// Run of that session.
    pub run: u32,
    /// Player the score is stored for.
    pub player: PlayerIdentity,
    /// Final score of the timed phase.
    pub score: i64,
}

/// Side effects produced by a session operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effects {
    /// Audio cues to emit, in order.
    pub cues: Vec<Cue>,
    /// Score to persist; present at most once per run.
    pub submission: Option<ScoreSubmission>,
}

/// Errors raised by session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The lifecycle does not allow the requested transition.
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
    /// The operation is only meaningful in another phase.
    #[error("operation requires {expected:?} phase, current phase {actual:?}")]
    WrongPhase {
        /// Phase the operation needs.
        expected: SessionPhase,
        /// Phase the session is in.
        actual: SessionPhase,
    },
    /// The review sequencer refused the operation.
    #[error(transparent)]
    Review(#[from] ReviewError),
}

/// One player's collocation-dash session.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    run: u32,
    player: Option<PlayerIdentity>,
    tuning: GameTuning,
    bank: Arc<ContentBank>,
    rng: StdRng,
    machine: SessionStateMachine,
    round: u32,
    clock: RoundClock,
    board: MatchBoard,
    ledger: MistakeLedger,
    review: Option<ReviewSequencer>,
    finish_reason: Option<FinishReason>,
    persisted: bool,
}

impl Session {
    /// Create an idle session drawing from `bank`.
    pub fn new(
        id: Uuid,
        player: Option<PlayerIdentity>,
        tuning: GameTuning,
        bank: Arc<ContentBank>,
    ) -> Self {
        Self::with_rng(id, player, tuning, bank, StdRng::from_os_rng())
    }

    /// Create an idle session with an explicit random source.
    pub fn with_rng(
        id: Uuid,
        player: Option<PlayerIdentity>,
        tuning: GameTuning,
        bank: Arc<ContentBank>,
        rng: StdRng,
    ) -> Self {
        Self {
            id,
            run: 1,
            player,
            tuning,
            bank,
            rng,
            machine: SessionStateMachine::new(),
            round: 0,
            clock: RoundClock::new(),
            board: MatchBoard::new(),
            ledger: MistakeLedger::new(),
            review: None,
            finish_reason: None,
            persisted: false,
        }
    }

    /// Begin a run: round 1, zero score, empty ledger, fresh pool and clock.
    pub fn start(&mut self) -> Result<Effects, SessionError> {
        self.machine.apply(SessionEvent::Start)?;
        self.reset_run();
        self.round = 1;
        self.begin_round(self.tuning.schedule.initial_secs);
        Ok(Effects::default())
    }

    /// Arm a verb, resolving the pair if a phrase is armed.
    pub fn arm_verb(&mut self, verb: &str) -> Result<(Resolution, Effects), SessionError> {
        self.ensure_phase(SessionPhase::Playing)?;
        let resolution = self.board.arm_verb(verb, &mut self.ledger);
        let effects = self.after_resolution(&resolution)?;
        Ok((resolution, effects))
    }

    /// Arm a phrase, resolving the pair if a verb is armed.
    pub fn arm_phrase(&mut self, phrase: &str) -> Result<(Resolution, Effects), SessionError> {
        self.ensure_phase(SessionPhase::Playing)?;
        let resolution = self.board.arm_phrase(phrase, &mut self.ledger);
        let effects = self.after_resolution(&resolution)?;
        Ok((resolution, effects))
    }

    /// Apply one clock second for the driver started at `epoch`.
    ///
    /// Ticks outside the playing phase or from a superseded epoch do nothing.
    pub fn tick(&mut self, epoch: u64) -> Result<Effects, SessionError> {
        if self.phase() != SessionPhase::Playing {
            debug!(session_id = %self.id, epoch, "ignoring tick outside playing phase");
            return Ok(Effects::default());
        }

        match self.clock.tick_for(epoch) {
            ClockTick::Idle => {
                debug!(session_id = %self.id, epoch, "ignoring stale clock tick");
                Ok(Effects::default())
            }
            ClockTick::Running { remaining_secs } => Ok(Effects {
                cues: vec![Cue::for_tick(
                    remaining_secs,
                    self.tuning.fast_threshold_secs,
                )],
                submission: None,
            }),
            ClockTick::Expired => self.finish(FinishReason::ClockExpired),
        }
    }

    /// End the timed phase on the player's request.
    ///
    /// Repeated requests, or a request racing the clock's expiry, are no-ops.
    pub fn end(&mut self) -> Result<Effects, SessionError> {
        self.finish(FinishReason::ManualStop)
    }

    /// Answer the current review item.
    pub fn answer_review(&mut self, verb: &str) -> Result<ReviewVerdict, SessionError> {
        self.ensure_phase(SessionPhase::Review)?;
        let review = self.review_mut()?;
        Ok(review.answer(verb)?)
    }

    /// Advance past the answered item at `expected_index`.
    ///
    /// Used by the feedback timer; a timer outliving its item is a no-op.
    pub fn advance_review(&mut self, expected_index: usize) -> Result<bool, SessionError> {
        if self.phase() != SessionPhase::Review {
            return Ok(false);
        }
        let review = self.review_mut()?;
        if !review.advance(expected_index) {
            return Ok(false);
        }
        let finished = review.is_finished();
        if finished {
            self.machine.apply(SessionEvent::ReviewCompleted)?;
        }
        Ok(true)
    }

    /// Advance past the current item on the player's request.
    pub fn next_review(&mut self) -> Result<(), SessionError> {
        self.ensure_phase(SessionPhase::Review)?;
        let index = self.review_mut()?.index();
        if !self.advance_review(index)? {
            return Err(ReviewError::Unanswered { index }.into());
        }
        Ok(())
    }

    /// Abandon the remaining review items and go to the summary.
    pub fn skip_review(&mut self) -> Result<(), SessionError> {
        self.ensure_phase(SessionPhase::Review)?;
        self.review_mut()?.skip();
        self.machine.apply(SessionEvent::SkipReview)?;
        Ok(())
    }

    /// Return to idle for another run, discarding every trace of the last one.
    pub fn play_again(&mut self) -> Result<(), SessionError> {
        self.machine.apply(SessionEvent::PlayAgain)?;
        self.reset_run();
        self.run += 1;
        self.round = 0;
        Ok(())
    }

    fn ensure_phase(&self, expected: SessionPhase) -> Result<(), SessionError> {
        let actual = self.phase();
        if actual == expected {
            Ok(())
        } else {
            Err(SessionError::WrongPhase { expected, actual })
        }
    }

    fn review_mut(&mut self) -> Result<&mut ReviewSequencer, SessionError> {
        let actual = self.phase();
        self.review.as_mut().ok_or(SessionError::WrongPhase {
            expected: SessionPhase::Review,
            actual,
        })
    }

    fn reset_run(&mut self) {
        self.clock.stop();
        self.board = MatchBoard::new();
        self.ledger.clear();
        self.review = None;
        self.finish_reason = None;
        self.persisted = false;
    }

    fn begin_round(&mut self, duration_secs: u32) {
        let pool = self.bank.draw(self.tuning.round_size, &mut self.rng);
        self.board.load_pool(pool);
        self.clock.start(duration_secs);
    }

    fn after_resolution(&mut self, resolution: &Resolution) -> Result<Effects, SessionError> {
        if !matches!(resolution, Resolution::Correct { .. }) || !self.board.is_clear() {
            return Ok(Effects::default());
        }

        self.machine.apply(SessionEvent::RoundCleared)?;
        self.round += 1;
        let next = self
            .tuning
            .schedule
            .next_duration(self.clock.duration_secs());
        self.begin_round(next);
        debug!(session_id = %self.id, round = self.round, duration_secs = next, "round cleared");

        Ok(Effects {
            cues: vec![Cue::RoundAdvance],
            submission: None,
        })
    }

    fn finish(&mut self, reason: FinishReason) -> Result<Effects, SessionError> {
        if self.phase() != SessionPhase::Playing {
            debug!(session_id = %self.id, ?reason, phase = ?self.phase(), "finish trigger ignored");
            return Ok(Effects::default());
        }

        self.clock.stop();
        self.board.clear_selection();

        let queue = self.ledger.dedup_for_review();
        let event = if queue.is_empty() {
            SessionEvent::Finish(reason)
        } else {
            SessionEvent::EnterReview(reason)
        };
        self.machine.apply(event)?;
        self.finish_reason = Some(reason);
        if !queue.is_empty() {
            self.review = Some(ReviewSequencer::new(queue));
        }

        Ok(Effects {
            cues: vec![Cue::SessionEnd],
            submission: self.claim_submission(),
        })
    }

    /// Flip the one-shot flag and hand out the score, once per run.
    fn claim_submission(&mut self) -> Option<ScoreSubmission> {
        if self.persisted {
            return None;
        }
        self.persisted = true;

        let Some(player) = self.player.clone() else {
            debug!(session_id = %self.id, "anonymous session; score will not be persisted");
            return None;
        };

        Some(ScoreSubmission {
            session_id: self.id,
            run: self.run,
            player,
            score: self.board.score(),
        })
    }

    /// Session identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Run counter, incremented by play-again.
    pub fn run(&self) -> u32 {
        self.run
    }

    /// Signed-in player, if any.
    pub fn player(&self) -> Option<&PlayerIdentity> {
        self.player.as_ref()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.machine.phase()
    }

    /// Lifecycle version, bumped by every transition.
    pub fn version(&self) -> usize {
        self.machine.snapshot().version
    }

    /// Current 1-based round, zero before the first start.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Round countdown.
    pub fn clock(&self) -> &RoundClock {
        &self.clock
    }

    /// Epoch of the running clock, if the clock is running.
    pub fn running_epoch(&self) -> Option<u64> {
        (self.phase() == SessionPhase::Playing && self.clock.is_running())
            .then(|| self.clock.epoch())
    }

    /// Pool, selection and score.
    pub fn board(&self) -> &MatchBoard {
        &self.board
    }

    /// Cumulative score of the run.
    pub fn score(&self) -> i64 {
        self.board.score()
    }

    /// Mistakes recorded during the run.
    pub fn ledger(&self) -> &MistakeLedger {
        &self.ledger
    }

    /// Review progress once the timed phase ended with mistakes.
    pub fn review(&self) -> Option<&ReviewSequencer> {
        self.review.as_ref()
    }

    /// Why the timed phase ended, once it has.
    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.finish_reason
    }

    /// Whether the run's score has already been handed to persistence.
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Verb choices offered to the player.
    pub fn verbs(&self) -> &[String] {
        self.bank.verbs()
    }

    /// Tuning the session plays with.
    pub fn tuning(&self) -> &GameTuning {
        &self.tuning
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::content::Collocation;

    fn bank() -> Arc<ContentBank> {
        Arc::new(ContentBank::new(vec![
            Collocation::new("make", "make a decision"),
            Collocation::new("take", "take a break"),
            Collocation::new("do", "do homework"),
            Collocation::new("have", "have a shower"),
            Collocation::new("catch", "catch a cold"),
        ]))
    }

    fn tuning() -> GameTuning {
        GameTuning {
            round_size: 5,
            schedule: ClockSchedule {
                initial_secs: 8,
                minimum_secs: 5,
                step_secs: 1,
            },
            fast_threshold_secs: 5,
        }
    }

    fn player() -> PlayerIdentity {
        PlayerIdentity {
            id: "user-1".into(),
            display_name: "Ana".into(),
        }
    }

    fn session(player: Option<PlayerIdentity>) -> Session {
        Session::with_rng(
            Uuid::new_v4(),
            player,
            tuning(),
            bank(),
            StdRng::seed_from_u64(42),
        )
    }

    fn started(player: Option<PlayerIdentity>) -> Session {
        let mut session = session(player);
        session.start().unwrap();
        session
    }

    fn run_clock_out(session: &mut Session) -> Effects {
        let epoch = session.running_epoch().unwrap();
        loop {
            let effects = session.tick(epoch).unwrap();
            if effects.cues.contains(&Cue::SessionEnd) {
                return effects;
            }
        }
    }

    fn correct_verb(session: &Session, phrase: &str) -> String {
        session.board().pool().get(phrase).unwrap().correct_verb.clone()
    }

    #[test]
    fn first_round_pool_holds_every_unique_entry() {
        let session = started(None);

        assert_eq!(session.phase(), SessionPhase::Playing);
        assert_eq!(session.round(), 1);
        assert_eq!(session.board().pool().len(), 5);
        assert_eq!(session.clock().remaining_secs(), 8);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn correct_then_stale_submission_scores_once() {
        let mut session = started(None);

        session.arm_verb("make").unwrap();
        let (resolution, _) = session.arm_phrase("make a decision").unwrap();
        assert!(matches!(resolution, Resolution::Correct { .. }));
        assert_eq!(session.score(), 10);
        assert_eq!(session.board().pool().len(), 4);

        session.arm_verb("take").unwrap();
        let (resolution, _) = session.arm_phrase("make a decision").unwrap();
        assert_eq!(resolution, Resolution::Ignored);
        assert_eq!(session.score(), 10);
        assert_eq!(session.board().pool().len(), 4);
        assert!(session.ledger().is_empty());
    }

    #[test]
    fn clock_expiry_with_mistakes_enters_review() {
        let mut session = started(Some(player()));
        session.arm_phrase("make a decision").unwrap();
        session.arm_verb("do").unwrap();
        session.arm_phrase("take a break").unwrap();
        session.arm_verb("make").unwrap();

        let effects = run_clock_out(&mut session);

        assert_eq!(session.phase(), SessionPhase::Review);
        assert_eq!(session.review().unwrap().len(), 2);
        assert_eq!(session.finish_reason(), Some(FinishReason::ClockExpired));
        assert_eq!(effects.submission.unwrap().score, -10);
    }

    #[test]
    fn clock_expiry_without_mistakes_goes_straight_to_over() {
        let mut session = started(Some(player()));

        run_clock_out(&mut session);

        assert_eq!(session.phase(), SessionPhase::Over);
        assert!(session.review().is_none());
    }

    #[test]
    fn ticks_emit_fast_cues_near_the_end() {
        let mut session = started(None);
        let epoch = session.running_epoch().unwrap();

        let cues: Vec<Cue> = (0..7)
            .flat_map(|_| session.tick(epoch).unwrap().cues)
            .collect();

        assert_eq!(
            cues,
            vec![
                Cue::Tick,
                Cue::Tick,
                Cue::TickFast,
                Cue::TickFast,
                Cue::TickFast,
                Cue::TickFast,
                Cue::TickFast
            ]
        );
        assert_eq!(session.clock().remaining_secs(), 1);
    }

    #[test]
    fn clearing_the_pool_advances_to_a_faster_round() {
        let mut session = started(None);
        let first_epoch = session.running_epoch().unwrap();
        let phrases: Vec<String> = session
            .board()
            .pool()
            .iter()
            .map(|entry| entry.phrase.clone())
            .collect();

        let mut last = Effects::default();
        for phrase in &phrases {
            let verb = correct_verb(&session, phrase);
            session.arm_phrase(phrase).unwrap();
            last = session.arm_verb(&verb).unwrap().1;
        }

        assert_eq!(last.cues, vec![Cue::RoundAdvance]);
        assert_eq!(session.phase(), SessionPhase::Playing);
        assert_eq!(session.round(), 2);
        assert_eq!(session.clock().duration_secs(), 7);
        assert_eq!(session.board().pool().len(), 5);
        assert_eq!(session.score(), 50);
        assert_ne!(session.running_epoch(), Some(first_epoch));
        assert!(session.tick(first_epoch).unwrap().cues.is_empty());
    }

    #[test]
    fn round_durations_shrink_to_the_floor() {
        let mut session = started(None);
        let mut durations = vec![session.clock().duration_secs()];

        for _ in 0..5 {
            let phrases: Vec<String> = session
                .board()
                .pool()
                .iter()
                .map(|entry| entry.phrase.clone())
                .collect();
            for phrase in &phrases {
                let verb = correct_verb(&session, phrase);
                session.arm_verb(&verb).unwrap();
                session.arm_phrase(phrase).unwrap();
            }
            durations.push(session.clock().duration_secs());
        }

        assert_eq!(durations, vec![8, 7, 6, 5, 5, 5]);
        assert_eq!(session.round(), 6);
    }

    #[test]
    fn racing_end_triggers_persist_once() {
        let mut session = started(Some(player()));
        session.arm_verb("make").unwrap();
        session.arm_phrase("make a decision").unwrap();
        let epoch = session.running_epoch().unwrap();
        for _ in 0..7 {
            session.tick(epoch).unwrap();
        }

        let expired = session.tick(epoch).unwrap();
        let manual = session.end().unwrap();

        let submission = expired.submission.expect("first trigger persists");
        assert_eq!(submission.score, 10);
        assert_eq!(submission.player, player());
        assert_eq!(manual, Effects::default());
        assert!(session.is_persisted());
    }

    #[test]
    fn manual_end_then_stale_expiry_is_a_no_op() {
        let mut session = started(Some(player()));
        let epoch = session.running_epoch().unwrap();

        let manual = session.end().unwrap();
        assert!(manual.submission.is_some());
        assert_eq!(session.finish_reason(), Some(FinishReason::ManualStop));

        for _ in 0..10 {
            assert_eq!(session.tick(epoch).unwrap(), Effects::default());
        }
        assert_eq!(session.end().unwrap(), Effects::default());
        assert_eq!(session.phase(), SessionPhase::Over);
    }

    #[test]
    fn anonymous_session_never_submits() {
        let mut session = started(None);

        let effects = session.end().unwrap();

        assert_eq!(effects.cues, vec![Cue::SessionEnd]);
        assert!(effects.submission.is_none());
        assert!(session.is_persisted());
    }

    #[test]
    fn review_answers_do_not_touch_main_score() {
        let mut session = started(None);
        session.arm_phrase("do homework").unwrap();
        session.arm_verb("make").unwrap();
        session.end().unwrap();
        assert_eq!(session.phase(), SessionPhase::Review);

        let verdict = session.answer_review("do").unwrap();
        assert!(verdict.correct);
        assert!(session.advance_review(verdict.index).unwrap());

        assert_eq!(session.phase(), SessionPhase::Over);
        assert_eq!(session.review().unwrap().review_score(), 1);
        assert_eq!(session.score(), -5);
    }

    #[test]
    fn next_requires_an_answer_first() {
        let mut session = started(None);
        session.arm_phrase("do homework").unwrap();
        session.arm_verb("make").unwrap();
        session.end().unwrap();

        assert_eq!(
            session.next_review(),
            Err(SessionError::Review(ReviewError::Unanswered { index: 0 }))
        );

        session.answer_review("have").unwrap();
        session.next_review().unwrap();
        assert_eq!(session.phase(), SessionPhase::Over);
        assert!(!session.advance_review(0).unwrap());
    }

    #[test]
    fn skip_review_ends_without_scoring() {
        let mut session = started(None);
        session.arm_phrase("do homework").unwrap();
        session.arm_verb("make").unwrap();
        session.arm_phrase("take a break").unwrap();
        session.arm_verb("make").unwrap();
        session.end().unwrap();

        session.skip_review().unwrap();

        let review = session.review().unwrap();
        assert_eq!(session.phase(), SessionPhase::Over);
        assert_eq!(review.index(), review.len());
        assert_eq!(review.review_score(), 0);
    }

    #[test]
    fn play_again_resets_everything_and_rearms_the_gate() {
        let mut session = started(Some(player()));
        session.arm_phrase("do homework").unwrap();
        session.arm_verb("make").unwrap();
        session.end().unwrap();
        session.skip_review().unwrap();

        session.play_again().unwrap();
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(session.run(), 2);
        assert!(!session.is_persisted());
        assert!(session.ledger().is_empty());

        session.start().unwrap();
        assert_eq!(session.score(), 0);
        assert_eq!(session.round(), 1);
        let effects = session.end().unwrap();
        let submission = effects.submission.unwrap();
        assert_eq!(submission.run, 2);
        assert_eq!(submission.score, 0);
    }

    #[test]
    fn operations_outside_their_phase_are_rejected() {
        let mut session = session(None);

        assert!(matches!(
            session.arm_verb("make"),
            Err(SessionError::WrongPhase {
                expected: SessionPhase::Playing,
                actual: SessionPhase::Idle
            })
        ));
        assert!(session.play_again().is_err());
        assert!(session.answer_review("make").is_err());

        session.start().unwrap();
        assert!(matches!(
            session.start(),
            Err(SessionError::Transition(_))
        ));
    }
}
