//! Async orchestration of the session engine.
//!
//! Every operation locks the session slot, runs the synchronous engine
//! method, keeps the clock driver in step with the running epoch and
//! broadcasts the resulting cues and snapshot before releasing the lock.
//! Score submissions produced by the engine are recorded on a detached task
//! once the lock is released, so a dropped request cannot cancel the write.

use std::sync::Arc;

use tokio::{task::JoinHandle, time::sleep};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::session::{
        CreateSessionRequest, MoveOutcome, MoveResponse, ReviewAnswerResponse,
        SessionActionResponse, SessionSummary, SessionView, VerdictView,
    },
    error::ServiceError,
    services::{clock_driver::ClockDriver, leaderboard_service, score_service, sse_events},
    state::{
        SessionHandle, SessionSlot, SharedState,
        cues::Cue,
        session::{Effects, Session, SessionError},
        state_machine::SessionPhase,
    },
};

/// Register a new idle session.
pub async fn create_session(
    state: &SharedState,
    request: CreateSessionRequest,
) -> Result<SessionView, ServiceError> {
    let player = request.player.map(Into::into);
    let session = Session::new(
        Uuid::new_v4(),
        player,
        state.config().tuning.clone(),
        state.bank(),
    );
    let view = SessionView::from(&session);
    state.insert_session(session);
    info!(session_id = %view.id, anonymous = view.player.is_none(), "session created");
    Ok(view)
}

/// Current snapshot of a session.
pub async fn get_session(state: &SharedState, session_id: Uuid) -> Result<SessionView, ServiceError> {
    let handle = find(state, session_id)?;
    let mut slot = handle.slot().lock().await;
    slot.touch();
    Ok(SessionView::from(&slot.session))
}

/// Discard a session and stop its clock. A run still in play is not scored.
pub async fn delete_session(state: &SharedState, session_id: Uuid) -> Result<(), ServiceError> {
    let handle = state
        .remove_session(session_id)
        .ok_or_else(|| not_found(session_id))?;
    let mut slot = handle.slot().lock().await;
    slot.driver = None;
    info!(%session_id, phase = ?slot.session.phase(), "session discarded");
    Ok(())
}

/// Start the timed phase.
pub async fn start_session(
    state: &SharedState,
    session_id: Uuid,
) -> Result<SessionActionResponse, ServiceError> {
    let ((), cues, session) = mutate(state, session_id, |session| {
        session.start().map(|effects| ((), effects))
    })
    .await?;
    Ok(SessionActionResponse { cues, session })
}

/// Arm a verb; resolves the pair when a phrase is already armed.
pub async fn arm_verb(
    state: &SharedState,
    session_id: Uuid,
    verb: &str,
) -> Result<MoveResponse, ServiceError> {
    let (resolution, cues, session) =
        mutate(state, session_id, |session| session.arm_verb(verb)).await?;
    Ok(MoveResponse {
        outcome: MoveOutcome::from(&resolution),
        score_delta: resolution.score_delta(),
        cues,
        session,
    })
}

/// Arm a phrase; resolves the pair when a verb is already armed.
pub async fn arm_phrase(
    state: &SharedState,
    session_id: Uuid,
    phrase: &str,
) -> Result<MoveResponse, ServiceError> {
    let (resolution, cues, session) =
        mutate(state, session_id, |session| session.arm_phrase(phrase)).await?;
    Ok(MoveResponse {
        outcome: MoveOutcome::from(&resolution),
        score_delta: resolution.score_delta(),
        cues,
        session,
    })
}

/// End the timed phase on the player's request.
pub async fn end_session(
    state: &SharedState,
    session_id: Uuid,
) -> Result<SessionActionResponse, ServiceError> {
    let ((), cues, session) = mutate(state, session_id, |session| {
        session.end().map(|effects| ((), effects))
    })
    .await?;
    Ok(SessionActionResponse { cues, session })
}

/// Answer the current review item and schedule its auto-advance.
pub async fn answer_review(
    state: &SharedState,
    session_id: Uuid,
    verb: &str,
) -> Result<ReviewAnswerResponse, ServiceError> {
    let handle = find(state, session_id)?;
    let ((verdict, run), _, session) = mutate_handle(state, &handle, |session| {
        let verdict = session.answer_review(verb)?;
        Ok(((verdict, session.run()), Effects::default()))
    })
    .await?;

    schedule_review_advance(state, &handle, run, verdict.index);

    Ok(ReviewAnswerResponse {
        verdict: VerdictView::from(verdict),
        session,
    })
}

/// Advance past the answered review item without waiting for the timer.
pub async fn next_review(
    state: &SharedState,
    session_id: Uuid,
) -> Result<SessionActionResponse, ServiceError> {
    let ((), cues, session) = mutate(state, session_id, |session| {
        session.next_review().map(|()| ((), Effects::default()))
    })
    .await?;
    Ok(SessionActionResponse { cues, session })
}

/// Abandon the remaining review items.
pub async fn skip_review(
    state: &SharedState,
    session_id: Uuid,
) -> Result<SessionActionResponse, ServiceError> {
    let ((), cues, session) = mutate(state, session_id, |session| {
        session.skip_review().map(|()| ((), Effects::default()))
    })
    .await?;
    Ok(SessionActionResponse { cues, session })
}

/// Go back to idle for another run.
pub async fn play_again(
    state: &SharedState,
    session_id: Uuid,
) -> Result<SessionActionResponse, ServiceError> {
    let ((), cues, session) = mutate(state, session_id, |session| {
        session.play_again().map(|()| ((), Effects::default()))
    })
    .await?;
    Ok(SessionActionResponse { cues, session })
}

/// Final summary of a finished run.
pub async fn summary(state: &SharedState, session_id: Uuid) -> Result<SessionSummary, ServiceError> {
    let handle = find(state, session_id)?;
    let (mut summary, player_id) = {
        let mut slot = handle.slot().lock().await;
        slot.touch();
        let session = &slot.session;
        if session.phase() != SessionPhase::Over {
            return Err(SessionError::WrongPhase {
                expected: SessionPhase::Over,
                actual: session.phase(),
            }
            .into());
        }

        let summary = SessionSummary {
            session_id,
            run: session.run(),
            score: session.score(),
            review_score: session.review().map_or(0, |review| review.review_score()),
            review_total: session.review().map_or(0, |review| review.len()),
            finish_reason: session.finish_reason().map(Into::into),
            personal_bests: Vec::new(),
        };
        (summary, session.player().map(|player| player.id.clone()))
    };

    if let Some(user_id) = player_id {
        summary.personal_bests = leaderboard_service::personal_best_or_empty(state, &user_id).await;
    }
    Ok(summary)
}

/// Apply one clock second for the driver bound to `epoch`.
///
/// Returns whether the driver should keep ticking.
pub async fn handle_tick(state: &SharedState, handle: &Arc<SessionHandle>, epoch: u64) -> bool {
    let (effects, keep_ticking) = {
        let mut slot = handle.slot().lock().await;
        let effects = match slot.session.tick(epoch) {
            Ok(effects) => effects,
            Err(err) => {
                warn!(session_id = %slot.session.id(), epoch, error = %err, "clock tick failed");
                Effects::default()
            }
        };

        let keep_ticking = slot.session.running_epoch() == Some(epoch);
        if !keep_ticking
            && let Some(driver) = slot.driver.take_if(|driver| driver.epoch() == epoch)
        {
            // This call runs inside the driver's own task.
            driver.detach();
        }

        if !effects.cues.is_empty() {
            sse_events::broadcast_cues(handle, &effects.cues, slot.session.clock().remaining_secs());
            sse_events::broadcast_session(handle, &SessionView::from(&slot.session));
        }
        (effects, keep_ticking)
    };

    if let Some(submission) = effects.submission {
        await_record(score_service::spawn_record(state, submission)).await;
    }
    keep_ticking
}

fn find(state: &SharedState, session_id: Uuid) -> Result<Arc<SessionHandle>, ServiceError> {
    state.session(session_id).ok_or_else(|| not_found(session_id))
}

fn not_found(session_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("session {session_id}"))
}

async fn mutate<T, F>(
    state: &SharedState,
    session_id: Uuid,
    op: F,
) -> Result<(T, Vec<Cue>, SessionView), ServiceError>
where
    F: FnOnce(&mut Session) -> Result<(T, Effects), SessionError>,
{
    let handle = find(state, session_id)?;
    mutate_handle(state, &handle, op).await
}

/// Run `op` as the single writer of the session, then carry out its effects.
async fn mutate_handle<T, F>(
    state: &SharedState,
    handle: &Arc<SessionHandle>,
    op: F,
) -> Result<(T, Vec<Cue>, SessionView), ServiceError>
where
    F: FnOnce(&mut Session) -> Result<(T, Effects), SessionError>,
{
    let (value, effects, view) = {
        let mut slot = handle.slot().lock().await;
        slot.touch();
        let (value, effects) = op(&mut slot.session)?;
        sync_clock_driver(state, handle, &mut slot);

        let view = SessionView::from(&slot.session);
        sse_events::broadcast_cues(handle, &effects.cues, view.clock.remaining_secs);
        sse_events::broadcast_session(handle, &view);
        (value, effects, view)
    };

    if let Some(submission) = effects.submission {
        await_record(score_service::spawn_record(state, submission)).await;
    }
    Ok((value, effects.cues, view))
}

/// Wait for a detached score write. Dropping this future leaves the write running.
async fn await_record(task: JoinHandle<()>) {
    if let Err(err) = task.await {
        warn!(error = %err, "score recording task failed");
    }
}

/// Make the slot's driver match the session's running clock epoch.
fn sync_clock_driver(state: &SharedState, handle: &Arc<SessionHandle>, slot: &mut SessionSlot) {
    match slot.session.running_epoch() {
        Some(epoch) if slot.driver.as_ref().map(ClockDriver::epoch) == Some(epoch) => {}
        Some(epoch) => {
            debug!(session_id = %slot.session.id(), epoch, "starting clock driver");
            slot.driver = Some(spawn_driver(state, handle, epoch));
        }
        None => {
            if let Some(driver) = slot.driver.take() {
                debug!(session_id = %slot.session.id(), epoch = driver.epoch(), "stopping clock driver");
            }
        }
    }
}

fn spawn_driver(state: &SharedState, handle: &Arc<SessionHandle>, epoch: u64) -> ClockDriver {
    let state = state.clone();
    let handle = Arc::downgrade(handle);
    ClockDriver::spawn(epoch, move || {
        let state = state.clone();
        let handle = handle.upgrade();
        async move {
            match handle {
                Some(handle) => handle_tick(&state, &handle, epoch).await,
                None => false,
            }
        }
    })
}

/// Advance past review item `index` of `run` once the feedback delay elapsed.
fn schedule_review_advance(state: &SharedState, handle: &Arc<SessionHandle>, run: u32, index: usize) {
    let delay = state.config().review_feedback_delay;
    if delay.is_zero() {
        return;
    }

    let handle = Arc::downgrade(handle);
    tokio::spawn(async move {
        sleep(delay).await;
        let Some(handle) = handle.upgrade() else {
            return;
        };

        let mut slot = handle.slot().lock().await;
        if slot.session.run() != run {
            debug!(session_id = %slot.session.id(), run, "review timer outlived its run");
            return;
        }
        match slot.session.advance_review(index) {
            Ok(true) => sse_events::broadcast_session(&handle, &SessionView::from(&slot.session)),
            Ok(false) => {
                debug!(session_id = %slot.session.id(), index, "stale review timer ignored");
            }
            Err(err) => warn!(session_id = %slot.session.id(), index, error = %err, "review auto-advance failed"),
        }
    });
}
