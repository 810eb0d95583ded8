use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use collocation_dash_back::{
    config::AppConfig,
    dao::{
        models::{LeaderboardEntryEntity, ScoreEntity},
        score_store::{ScoreStore, memory::MemoryScoreStore},
        storage::{StorageError, StorageResult},
    },
    dto::{
        phase::VisibleSessionPhase,
        session::{CreateSessionRequest, MoveOutcome, PlayerInput, SessionView},
    },
    error::ServiceError,
    services::{leaderboard_service, session_service},
    state::{
        AppState, SharedState,
        clock::ClockSchedule,
        content::Collocation,
        cues::Cue,
        session::GameTuning,
        state_machine::SessionPhase,
    },
};
use futures::future::BoxFuture;
use tokio::time::{sleep, timeout};
use uuid::Uuid;

/// Store counting writes, optionally failing every call or delaying score writes.
#[derive(Default)]
struct CountingStore {
    inner: MemoryScoreStore,
    persisted: AtomicUsize,
    submitted: AtomicUsize,
    failing: bool,
    write_delay: Duration,
}

impl CountingStore {
    fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    fn slow(write_delay: Duration) -> Self {
        Self {
            write_delay,
            ..Self::default()
        }
    }

    fn persisted(&self) -> usize {
        self.persisted.load(Ordering::SeqCst)
    }

    fn fail<T: Send + 'static>() -> BoxFuture<'static, StorageResult<T>> {
        Box::pin(async {
            Err(StorageError::unavailable(
                "memory",
                std::io::Error::other("connection refused"),
            ))
        })
    }
}

impl ScoreStore for CountingStore {
    fn persist_score(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.persisted.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Self::fail();
        }
        let write = self.inner.persist_score(score);
        if self.write_delay.is_zero() {
            return write;
        }
        let delay = self.write_delay;
        Box::pin(async move {
            sleep(delay).await;
            write.await
        })
    }

    fn submit_leaderboard_entry(
        &self,
        entry: LeaderboardEntryEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.submitted.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Self::fail();
        }
        self.inner.submit_leaderboard_entry(entry)
    }

    fn fetch_top_entries(
        &self,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<LeaderboardEntryEntity>>> {
        if self.failing {
            return Self::fail();
        }
        self.inner.fetch_top_entries(limit)
    }

    fn fetch_top_personal_scores(
        &self,
        user_id: String,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        if self.failing {
            return Self::fail();
        }
        self.inner.fetch_top_personal_scores(user_id, limit)
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

const BANK: [(&str, &str); 3] = [
    ("make", "a decision"),
    ("take", "a break"),
    ("do", "homework"),
];

fn config(initial_secs: u32, review_delay: Duration) -> AppConfig {
    AppConfig {
        tuning: GameTuning {
            round_size: 3,
            schedule: ClockSchedule {
                initial_secs,
                minimum_secs: 1,
                step_secs: 1,
            },
            fast_threshold_secs: 1,
        },
        review_feedback_delay: review_delay,
        leaderboard_size: 10,
        personal_best_count: 5,
        session_ttl: Duration::from_secs(600),
        collocations: BANK
            .iter()
            .map(|(verb, phrase)| Collocation::new(*verb, *phrase))
            .collect(),
    }
}

fn correct_verb(phrase: &str) -> &'static str {
    BANK.iter()
        .find(|(_, candidate)| *candidate == phrase)
        .map(|(verb, _)| *verb)
        .unwrap()
}

fn wrong_verb(phrase: &str) -> &'static str {
    BANK.iter()
        .map(|(verb, _)| *verb)
        .find(|verb| *verb != correct_verb(phrase))
        .unwrap()
}

async fn setup(
    config: AppConfig,
    store: Option<Arc<CountingStore>>,
) -> SharedState {
    let state = AppState::new(config);
    if let Some(store) = store {
        state.set_score_store(store).await;
    }
    state
}

fn player() -> CreateSessionRequest {
    CreateSessionRequest {
        player: Some(PlayerInput {
            id: "ana-1".into(),
            display_name: "Ana".into(),
        }),
    }
}

async fn started(state: &SharedState, request: CreateSessionRequest) -> Uuid {
    let created = session_service::create_session(state, request).await.unwrap();
    session_service::start_session(state, created.id)
        .await
        .unwrap();
    created.id
}

async fn running_epoch(state: &SharedState, id: Uuid) -> u64 {
    let handle = state.session(id).unwrap();
    let slot = handle.slot().lock().await;
    slot.session.running_epoch().unwrap()
}

async fn snapshot(state: &SharedState, id: Uuid) -> SessionView {
    session_service::get_session(state, id).await.unwrap()
}

#[tokio::test(start_paused = true)]
async fn racing_end_and_expiry_persist_exactly_once() {
    let store = Arc::new(CountingStore::default());
    let state = setup(config(1, Duration::ZERO), Some(store.clone())).await;
    let id = started(&state, player()).await;

    let epoch = running_epoch(&state, id).await;
    let handle = state.session(id).unwrap();
    let (ended, keep_ticking) = tokio::join!(
        session_service::end_session(&state, id),
        session_service::handle_tick(&state, &handle, epoch),
    );
    ended.unwrap();
    assert!(!keep_ticking);

    // Let the driver fire on its own as well.
    sleep(Duration::from_secs(3)).await;

    assert_eq!(store.persisted(), 1);
    assert_eq!(store.submitted.load(Ordering::SeqCst), 1);
    let view = snapshot(&state, id).await;
    assert_eq!(view.phase, VisibleSessionPhase::Over);
    assert!(view.persisted);
}

#[tokio::test(start_paused = true)]
async fn clock_expiry_ends_the_run_and_updates_the_leaderboard() {
    let store = Arc::new(CountingStore::default());
    let state = setup(config(2, Duration::ZERO), Some(store.clone())).await;
    let id = started(&state, player()).await;

    sleep(Duration::from_millis(1_500)).await;
    let view = snapshot(&state, id).await;
    assert_eq!(view.phase, VisibleSessionPhase::Playing);
    assert_eq!(view.clock.remaining_secs, 1);

    sleep(Duration::from_secs(2)).await;
    let view = snapshot(&state, id).await;
    assert_eq!(view.phase, VisibleSessionPhase::Over);
    assert!(!view.clock.running);
    assert_eq!(store.persisted(), 1);

    let leaderboard = leaderboard_service::top_entries(&state, None).await.unwrap();
    assert_eq!(leaderboard.entries.len(), 1);
    assert_eq!(leaderboard.entries[0].user_id, "ana-1");
    assert_eq!(leaderboard.entries[0].display_name, "Ana");
}

#[tokio::test(start_paused = true)]
async fn repeated_end_requests_are_no_ops() {
    let store = Arc::new(CountingStore::default());
    let state = setup(config(30, Duration::ZERO), Some(store.clone())).await;
    let id = started(&state, player()).await;

    let first = session_service::end_session(&state, id).await.unwrap();
    let second = session_service::end_session(&state, id).await.unwrap();

    assert_eq!(first.cues, vec![Cue::SessionEnd]);
    assert!(second.cues.is_empty());
    assert_eq!(store.persisted(), 1);
}

#[tokio::test(start_paused = true)]
async fn abandoned_end_request_still_stores_the_score() {
    let store = Arc::new(CountingStore::slow(Duration::from_secs(1)));
    let state = setup(config(30, Duration::ZERO), Some(store.clone())).await;
    let id = started(&state, player()).await;

    // The client goes away while the score write is still in flight.
    let ended = timeout(
        Duration::from_millis(100),
        session_service::end_session(&state, id),
    )
    .await;
    assert!(ended.is_err());

    sleep(Duration::from_secs(10)).await;

    let view = snapshot(&state, id).await;
    assert_eq!(view.phase, VisibleSessionPhase::Over);
    assert!(view.persisted);
    assert_eq!(store.persisted(), 1);
    let stored = store
        .inner
        .fetch_top_personal_scores("ana-1".into(), 10)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    let leaderboard = leaderboard_service::top_entries(&state, None).await.unwrap();
    assert_eq!(leaderboard.entries.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn anonymous_sessions_never_persist() {
    let store = Arc::new(CountingStore::default());
    let state = setup(config(30, Duration::ZERO), Some(store.clone())).await;
    let id = started(&state, CreateSessionRequest::default()).await;

    let ended = session_service::end_session(&state, id).await.unwrap();

    assert_eq!(ended.session.phase, VisibleSessionPhase::Over);
    assert!(ended.session.persisted);
    assert_eq!(store.persisted(), 0);

    let summary = session_service::summary(&state, id).await.unwrap();
    assert!(summary.personal_bests.is_empty());
}

#[tokio::test(start_paused = true)]
async fn failing_store_does_not_break_the_session() {
    let store = Arc::new(CountingStore::failing());
    let state = setup(config(30, Duration::ZERO), Some(store.clone())).await;
    let id = started(&state, player()).await;

    let ended = session_service::end_session(&state, id).await.unwrap();

    assert_eq!(ended.session.phase, VisibleSessionPhase::Over);
    assert!(ended.session.persisted);
    assert_eq!(store.persisted(), 1);
    assert_eq!(store.submitted.load(Ordering::SeqCst), 0);

    let summary = session_service::summary(&state, id).await.unwrap();
    assert!(summary.personal_bests.is_empty());

    session_service::play_again(&state, id).await.unwrap();
    session_service::start_session(&state, id).await.unwrap();
    session_service::end_session(&state, id).await.unwrap();
    assert_eq!(store.persisted(), 2);
}

#[tokio::test(start_paused = true)]
async fn degraded_mode_skips_persistence() {
    let state = setup(config(30, Duration::ZERO), None).await;
    let id = started(&state, player()).await;

    let ended = session_service::end_session(&state, id).await.unwrap();

    assert_eq!(ended.session.phase, VisibleSessionPhase::Over);
    assert!(matches!(
        leaderboard_service::top_entries(&state, None).await,
        Err(ServiceError::Degraded)
    ));
}

#[tokio::test(start_paused = true)]
async fn clearing_the_pool_starts_a_shorter_round() {
    let state = setup(config(10, Duration::ZERO), None).await;
    let id = started(&state, player()).await;
    let first_epoch = running_epoch(&state, id).await;

    let phrases: Vec<String> = snapshot(&state, id)
        .await
        .pool
        .into_iter()
        .map(|card| card.phrase)
        .collect();
    let mut last = None;
    for phrase in &phrases {
        session_service::arm_phrase(&state, id, phrase).await.unwrap();
        last = Some(
            session_service::arm_verb(&state, id, correct_verb(phrase))
                .await
                .unwrap(),
        );
    }

    let last = last.unwrap();
    assert!(matches!(last.outcome, MoveOutcome::Correct));
    assert_eq!(last.cues, vec![Cue::RoundAdvance]);
    assert_eq!(last.session.round, 2);
    assert_eq!(last.session.score, 30);
    assert_eq!(last.session.clock.duration_secs, 9);
    assert_ne!(running_epoch(&state, id).await, first_epoch);

    sleep(Duration::from_millis(2_500)).await;
    assert_eq!(snapshot(&state, id).await.clock.remaining_secs, 7);
}

#[tokio::test(start_paused = true)]
async fn review_auto_advances_after_feedback_delay() {
    let state = setup(config(30, Duration::from_millis(1_500)), None).await;
    let id = started(&state, player()).await;

    let phrases: Vec<String> = snapshot(&state, id)
        .await
        .pool
        .into_iter()
        .map(|card| card.phrase)
        .collect();
    for phrase in phrases.iter().take(2) {
        session_service::arm_phrase(&state, id, phrase).await.unwrap();
        let moved = session_service::arm_verb(&state, id, wrong_verb(phrase))
            .await
            .unwrap();
        assert!(matches!(moved.outcome, MoveOutcome::Incorrect));
    }

    let ended = session_service::end_session(&state, id).await.unwrap();
    assert_eq!(ended.session.phase, VisibleSessionPhase::Review);
    assert_eq!(ended.session.score, -10);

    let early = session_service::next_review(&state, id).await;
    assert!(matches!(early, Err(ServiceError::Session(_))));

    let answered = session_service::answer_review(&state, id, correct_verb(&phrases[0]))
        .await
        .unwrap();
    assert!(answered.verdict.correct);
    assert_eq!(answered.session.review.as_ref().unwrap().index, 0);

    sleep(Duration::from_secs(2)).await;
    let review = snapshot(&state, id).await.review.unwrap();
    assert_eq!(review.index, 1);
    assert_eq!(review.review_score, 1);

    // An explicit next followed by a fresh answer is not skipped by a late timer.
    session_service::answer_review(&state, id, wrong_verb(&phrases[1]))
        .await
        .unwrap();
    let done = session_service::next_review(&state, id).await.unwrap();
    assert_eq!(done.session.phase, VisibleSessionPhase::Over);

    sleep(Duration::from_secs(2)).await;
    let summary = session_service::summary(&state, id).await.unwrap();
    assert_eq!(summary.review_score, 1);
    assert_eq!(summary.review_total, 2);
}

#[tokio::test(start_paused = true)]
async fn deleted_sessions_stop_ticking() {
    let store = Arc::new(CountingStore::default());
    let state = setup(config(2, Duration::ZERO), Some(store.clone())).await;
    let id = started(&state, player()).await;

    session_service::delete_session(&state, id).await.unwrap();
    sleep(Duration::from_secs(5)).await;

    assert_eq!(state.session_count(), 0);
    assert_eq!(store.persisted(), 0);
    assert!(matches!(
        session_service::get_session(&state, id).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn review_timer_is_kept_when_the_session_is_removed_mid_answer() {
    let state = setup(config(30, Duration::from_millis(1_500)), None).await;
    let id = started(&state, player()).await;

    let phrase = snapshot(&state, id).await.pool[0].phrase.clone();
    session_service::arm_phrase(&state, id, &phrase).await.unwrap();
    session_service::arm_verb(&state, id, wrong_verb(&phrase))
        .await
        .unwrap();
    session_service::end_session(&state, id).await.unwrap();

    let handle = state.session(id).unwrap();
    let guard = handle.slot().lock().await;
    let answer = tokio::spawn({
        let state = state.clone();
        let verb = correct_verb(&phrase);
        async move { session_service::answer_review(&state, id, verb).await }
    });
    // Let the answer find the session and queue on its lock.
    tokio::task::yield_now().await;
    state.remove_session(id);
    drop(guard);

    answer.await.unwrap().unwrap();
    sleep(Duration::from_secs(2)).await;

    let slot = handle.slot().lock().await;
    assert_eq!(slot.session.phase(), SessionPhase::Over);
    assert_eq!(slot.session.review().map(|review| review.index()), Some(1));
}
