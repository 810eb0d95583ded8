use thiserror::Error;

/// High-level phases a session can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Session created or reset; no run in progress.
    Idle,
    /// Timed matching rounds are running.
    Playing,
    /// The timed phase ended and mistakes are being reviewed.
    Review,
    /// Final summary is displayed.
    Over,
}

/// Indicates why the timed phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// The round clock ran out.
    ClockExpired,
    /// The player ended the game.
    ManualStop,
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Player starts a run from idle.
    Start,
    /// Every phrase of the round was matched; a new round begins.
    RoundCleared,
    /// Timed phase ended with mistakes to review.
    EnterReview(FinishReason),
    /// Timed phase ended without mistakes.
    Finish(FinishReason),
    /// The last review item was advanced past.
    ReviewCompleted,
    /// Player skipped the remaining review items.
    SkipReview,
    /// Player asked for another run.
    PlayAgain,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: SessionPhase,
    /// The event that cannot be applied from this phase.
    pub event: SessionEvent,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the state machine.
    pub phase: SessionPhase,
    /// Version number of the state machine (increments on each transition).
    pub version: usize,
}

/// Lifecycle of one session: idle, playing, review, over.
#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    phase: SessionPhase,
    version: usize,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            version: 0,
        }
    }
}

impl SessionStateMachine {
    /// Create a new state machine initialised in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
        }
    }

    /// Apply `event`, returning the phase reached.
    pub fn apply(&mut self, event: SessionEvent) -> Result<SessionPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        self.version += 1;
        Ok(next)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: SessionEvent) -> Result<SessionPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (SessionPhase::Idle, SessionEvent::Start) => SessionPhase::Playing,
            (SessionPhase::Playing, SessionEvent::RoundCleared) => SessionPhase::Playing,
            (SessionPhase::Playing, SessionEvent::EnterReview(_)) => SessionPhase::Review,
            (SessionPhase::Playing, SessionEvent::Finish(_)) => SessionPhase::Over,
            (SessionPhase::Review, SessionEvent::ReviewCompleted | SessionEvent::SkipReview) => {
                SessionPhase::Over
            }
            (SessionPhase::Over, SessionEvent::PlayAgain) => SessionPhase::Idle,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}
