//! Request and response types of the session REST API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        leaderboard::PersonalScoreView,
        phase::{VisibleFinishReason, VisibleSessionPhase},
        validation::{validate_not_blank, validate_user_id},
    },
    state::{
        cues::Cue,
        matching::Resolution,
        mistakes::MistakeRecord,
        review::{ReviewSequencer, ReviewVerdict},
        session::{PlayerIdentity, Session},
    },
};

/// Payload for `POST /sessions`.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct CreateSessionRequest {
    /// Signed-in player; anonymous sessions never persist scores.
    #[serde(default)]
    #[validate(nested)]
    pub player: Option<PlayerInput>,
}

/// Identity supplied by the client at session creation.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PlayerInput {
    #[validate(custom(function = "validate_user_id"))]
    pub id: String,
    #[validate(length(min = 1, max = 40), custom(function = "validate_not_blank"))]
    pub display_name: String,
}

impl From<PlayerInput> for PlayerIdentity {
    fn from(value: PlayerInput) -> Self {
        Self {
            id: value.id,
            display_name: value.display_name.trim().to_owned(),
        }
    }
}

/// Payload for `POST /sessions/{id}/verb` and `/review/answer`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct VerbRequest {
    #[validate(length(min = 1, max = 64), custom(function = "validate_not_blank"))]
    pub verb: String,
}

/// Payload for `POST /sessions/{id}/phrase`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PhraseRequest {
    #[validate(length(min = 1, max = 256), custom(function = "validate_not_blank"))]
    pub phrase: String,
}

/// Round clock as shown to the player.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ClockView {
    pub duration_secs: u32,
    pub remaining_secs: u32,
    pub running: bool,
    /// Remaining time is at or under the fast-tick threshold.
    pub fast: bool,
}

/// A phrase card still in play.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PhraseCard {
    pub phrase: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Tentative selection of the player.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct SelectionView {
    pub verb: Option<String>,
    pub phrase: Option<String>,
}

/// Mistake presented for review, without the answer.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ReviewItemView {
    pub phrase: String,
    /// The wrong verb picked during play.
    pub selected_verb: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

impl From<&MistakeRecord> for ReviewItemView {
    fn from(value: &MistakeRecord) -> Self {
        Self {
            phrase: value.phrase.clone(),
            selected_verb: value.selected_verb.clone(),
            hint: value.entry.hint.clone(),
            definition: value.entry.definition.clone(),
            example: value.entry.example.clone(),
            translation: value.entry.translation.clone(),
        }
    }
}

/// Verdict on one review answer.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct VerdictView {
    pub index: usize,
    pub correct: bool,
    pub correct_verb: String,
}

impl From<ReviewVerdict> for VerdictView {
    fn from(value: ReviewVerdict) -> Self {
        Self {
            index: value.index,
            correct: value.correct,
            correct_verb: value.correct_verb,
        }
    }
}

/// Review progress.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ReviewView {
    pub index: usize,
    pub total: usize,
    pub review_score: u32,
    pub current: Option<ReviewItemView>,
    /// Verdict of the current item once answered, until it is advanced past.
    pub last_verdict: Option<VerdictView>,
}

impl From<&ReviewSequencer> for ReviewView {
    fn from(value: &ReviewSequencer) -> Self {
        Self {
            index: value.index(),
            total: value.len(),
            review_score: value.review_score(),
            current: value.current().map(ReviewItemView::from),
            last_verdict: value.pending_verdict().cloned().map(VerdictView::from),
        }
    }
}

/// Player shown on a session.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PlayerView {
    pub id: String,
    pub display_name: String,
}

impl From<&PlayerIdentity> for PlayerView {
    fn from(value: &PlayerIdentity) -> Self {
        Self {
            id: value.id.clone(),
            display_name: value.display_name.clone(),
        }
    }
}

/// Full snapshot of a session, taken after each mutation.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct SessionView {
    pub id: Uuid,
    pub run: u32,
    pub version: usize,
    pub phase: VisibleSessionPhase,
    pub round: u32,
    pub score: i64,
    pub clock: ClockView,
    pub pool: Vec<PhraseCard>,
    pub verbs: Vec<String>,
    pub selection: SelectionView,
    pub mistake_count: usize,
    pub review: Option<ReviewView>,
    pub finish_reason: Option<VisibleFinishReason>,
    pub persisted: bool,
    pub player: Option<PlayerView>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        let clock = session.clock();
        let board = session.board();
        Self {
            id: session.id(),
            run: session.run(),
            version: session.version(),
            phase: session.phase().into(),
            round: session.round(),
            score: session.score(),
            clock: ClockView {
                duration_secs: clock.duration_secs(),
                remaining_secs: clock.remaining_secs(),
                running: clock.is_running(),
                fast: clock.is_fast(session.tuning().fast_threshold_secs),
            },
            pool: board
                .pool()
                .iter()
                .map(|entry| PhraseCard {
                    phrase: entry.phrase.clone(),
                    hint: entry.hint.clone(),
                })
                .collect(),
            verbs: session.verbs().to_vec(),
            selection: SelectionView {
                verb: board.armed_verb().map(str::to_owned),
                phrase: board.armed_phrase().map(str::to_owned),
            },
            mistake_count: session.ledger().len(),
            review: session.review().map(ReviewView::from),
            finish_reason: session.finish_reason().map(Into::into),
            persisted: session.is_persisted(),
            player: session.player().map(PlayerView::from),
        }
    }
}

/// Outcome of arming a verb or phrase.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MoveOutcome {
    /// Only one side of the pair is armed.
    Armed,
    /// The phrase is no longer in play.
    Ignored,
    Correct,
    Incorrect,
}

impl From<&Resolution> for MoveOutcome {
    fn from(value: &Resolution) -> Self {
        match value {
            Resolution::Armed => MoveOutcome::Armed,
            Resolution::Ignored => MoveOutcome::Ignored,
            Resolution::Correct { .. } => MoveOutcome::Correct,
            Resolution::Incorrect { .. } => MoveOutcome::Incorrect,
        }
    }
}

/// Response to a verb or phrase selection.
#[derive(Debug, Serialize, ToSchema)]
pub struct MoveResponse {
    pub outcome: MoveOutcome,
    pub score_delta: i64,
    #[schema(value_type = Vec<String>)]
    pub cues: Vec<Cue>,
    pub session: SessionView,
}

/// Response to any other session operation.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionActionResponse {
    #[schema(value_type = Vec<String>)]
    pub cues: Vec<Cue>,
    pub session: SessionView,
}

/// Response to a review answer.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewAnswerResponse {
    pub verdict: VerdictView,
    pub session: SessionView,
}

/// Final summary shown once the run is over.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub run: u32,
    pub score: i64,
    pub review_score: u32,
    pub review_total: usize,
    pub finish_reason: Option<VisibleFinishReason>,
    /// Best persisted runs of the player; empty for anonymous sessions or
    /// while the score store is unavailable.
    pub personal_bests: Vec<PersonalScoreView>,
}
