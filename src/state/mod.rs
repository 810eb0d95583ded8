pub mod clock;
pub mod content;
pub mod cues;
pub mod matching;
pub mod mistakes;
pub mod review;
pub mod session;
mod sse;
pub mod state_machine;

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::{
    sync::{Mutex, RwLock, watch},
    time::Instant,
};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::score_store::ScoreStore,
    error::ServiceError,
    services::clock_driver::ClockDriver,
    state::{content::ContentBank, session::Session},
};

pub use self::sse::SseHub;

pub type SharedState = Arc<AppState>;

const SESSION_EVENTS_CAPACITY: usize = 64;
const LEADERBOARD_EVENTS_CAPACITY: usize = 16;

/// A session together with the task currently driving its clock.
pub struct SessionSlot {
    /// The engine aggregate.
    pub session: Session,
    /// Driver bound to the running clock epoch, if any.
    pub driver: Option<ClockDriver>,
    last_touched: Instant,
}

impl SessionSlot {
    /// Record player activity.
    pub fn touch(&mut self) {
        self.last_touched = Instant::now();
    }

    /// Time since the last player activity.
    pub fn idle_for(&self) -> Duration {
        self.last_touched.elapsed()
    }
}

/// Registry entry for one session.
///
/// The mutex is the single writer: every engine operation, tick and review
/// timer goes through it, so no two mutations ever interleave.
pub struct SessionHandle {
    slot: Mutex<SessionSlot>,
    events: SseHub,
}

impl SessionHandle {
    fn new(session: Session) -> Self {
        Self {
            slot: Mutex::new(SessionSlot {
                session,
                driver: None,
                last_touched: Instant::now(),
            }),
            events: SseHub::new(SESSION_EVENTS_CAPACITY),
        }
    }

    /// Lock the session for a mutation or a consistent read.
    pub fn slot(&self) -> &Mutex<SessionSlot> {
        &self.slot
    }

    /// Broadcast hub for this session's cues and snapshots.
    pub fn events(&self) -> &SseHub {
        &self.events
    }
}

/// Central application state shared by every request and background task.
pub struct AppState {
    config: AppConfig,
    bank: Arc<ContentBank>,
    sessions: DashMap<Uuid, Arc<SessionHandle>>,
    score_store: RwLock<Option<Arc<dyn ScoreStore>>>,
    leaderboard_sse: SseHub,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a score store is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let bank = Arc::new(ContentBank::new(config.collocations.clone()));
        Arc::new(Self {
            config,
            bank,
            sessions: DashMap::new(),
            score_store: RwLock::new(None),
            leaderboard_sse: SseHub::new(LEADERBOARD_EVENTS_CAPACITY),
            degraded: degraded_tx,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Content every session draws from.
    pub fn bank(&self) -> Arc<ContentBank> {
        self.bank.clone()
    }

    /// Register a fresh session and return its handle.
    pub fn insert_session(&self, session: Session) -> Arc<SessionHandle> {
        let id = session.id();
        let handle = Arc::new(SessionHandle::new(session));
        self.sessions.insert(id, handle.clone());
        handle
    }

    /// Look up a live session.
    pub fn session(&self, id: Uuid) -> Option<Arc<SessionHandle>> {
        self.sessions.get(&id).map(|entry| entry.value().clone())
    }

    /// Drop a session from the registry, returning its handle if it existed.
    pub fn remove_session(&self, id: Uuid) -> Option<Arc<SessionHandle>> {
        self.sessions.remove(&id).map(|(_, handle)| handle)
    }

    /// Snapshot of the registry, safe to hold across `.await`.
    pub fn session_handles(&self) -> Vec<(Uuid, Arc<SessionHandle>)> {
        self.sessions
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Obtain a handle to the current score store, if one is installed.
    pub async fn score_store(&self) -> Option<Arc<dyn ScoreStore>> {
        let guard = self.score_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the score store, failing while in degraded mode.
    pub async fn require_score_store(&self) -> Result<Arc<dyn ScoreStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.score_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new score store implementation and leave degraded mode.
    pub async fn set_score_store(&self, store: Arc<dyn ScoreStore>) {
        {
            let mut guard = self.score_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current score store and enter degraded mode.
    pub async fn clear_score_store(&self) {
        {
            let mut guard = self.score_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Broadcast hub used for leaderboard refreshes.
    pub fn leaderboard_sse(&self) -> &SseHub {
        &self.leaderboard_sse
    }
}
