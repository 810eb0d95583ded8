use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::session::{
        CreateSessionRequest, MoveResponse, PhraseRequest, ReviewAnswerResponse,
        SessionActionResponse, SessionSummary, SessionView, VerbRequest,
    },
    error::AppError,
    services::session_service,
    state::SharedState,
};

/// Session lifecycle, moves and review endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/start", post(start_session))
        .route("/sessions/{id}/verb", post(arm_verb))
        .route("/sessions/{id}/phrase", post(arm_phrase))
        .route("/sessions/{id}/end", post(end_session))
        .route("/sessions/{id}/review/answer", post(answer_review))
        .route("/sessions/{id}/review/next", post(next_review))
        .route("/sessions/{id}/review/skip", post(skip_review))
        .route("/sessions/{id}/play-again", post(play_again))
        .route("/sessions/{id}/summary", get(session_summary))
}

/// Create an idle session, optionally bound to a signed-in player.
#[utoipa::path(
    post,
    path = "/sessions",
    tag = "sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session created", body = SessionView),
        (status = 400, description = "Invalid player identity")
    )
)]
pub async fn create_session(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateSessionRequest>>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let view = session_service::create_session(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Snapshot of a session.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Session snapshot", body = SessionView),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(session_service::get_session(&state, id).await?))
}

#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 204, description = "Session discarded"),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn delete_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    session_service::delete_session(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Start the timed phase with a fresh pool and clock.
#[utoipa::path(
    post,
    path = "/sessions/{id}/start",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Session started", body = SessionActionResponse),
        (status = 409, description = "Session is not idle")
    )
)]
pub async fn start_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionActionResponse>, AppError> {
    Ok(Json(session_service::start_session(&state, id).await?))
}

/// Select a verb; evaluates the pair when a phrase is already selected.
#[utoipa::path(
    post,
    path = "/sessions/{id}/verb",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session identifier")),
    request_body = VerbRequest,
    responses(
        (status = 200, description = "Move applied", body = MoveResponse),
        (status = 409, description = "Session is not playing")
    )
)]
pub async fn arm_verb(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<VerbRequest>>,
) -> Result<Json<MoveResponse>, AppError> {
    Ok(Json(
        session_service::arm_verb(&state, id, payload.verb.trim()).await?,
    ))
}

/// Select a phrase; evaluates the pair when a verb is already selected.
#[utoipa::path(
    post,
    path = "/sessions/{id}/phrase",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session identifier")),
    request_body = PhraseRequest,
    responses(
        (status = 200, description = "Move applied", body = MoveResponse),
        (status = 409, description = "Session is not playing")
    )
)]
pub async fn arm_phrase(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<PhraseRequest>>,
) -> Result<Json<MoveResponse>, AppError> {
    Ok(Json(
        session_service::arm_phrase(&state, id, &payload.phrase).await?,
    ))
}

/// Stop the timed phase early. Repeated calls leave the session unchanged.
#[utoipa::path(
    post,
    path = "/sessions/{id}/end",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses((status = 200, description = "Timed phase ended", body = SessionActionResponse))
)]
pub async fn end_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionActionResponse>, AppError> {
    Ok(Json(session_service::end_session(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/review/answer",
    tag = "review",
    params(("id" = Uuid, Path, description = "Session identifier")),
    request_body = VerbRequest,
    responses(
        (status = 200, description = "Answer judged", body = ReviewAnswerResponse),
        (status = 409, description = "No review item awaits an answer")
    )
)]
pub async fn answer_review(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<VerbRequest>>,
) -> Result<Json<ReviewAnswerResponse>, AppError> {
    Ok(Json(
        session_service::answer_review(&state, id, payload.verb.trim()).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/review/next",
    tag = "review",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Advanced to the next item", body = SessionActionResponse),
        (status = 409, description = "Current item not answered yet")
    )
)]
pub async fn next_review(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionActionResponse>, AppError> {
    Ok(Json(session_service::next_review(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/review/skip",
    tag = "review",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Review skipped", body = SessionActionResponse),
        (status = 409, description = "Session is not in review")
    )
)]
pub async fn skip_review(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionActionResponse>, AppError> {
    Ok(Json(session_service::skip_review(&state, id).await?))
}

/// Reset a finished session for another run.
#[utoipa::path(
    post,
    path = "/sessions/{id}/play-again",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Session back to idle", body = SessionActionResponse),
        (status = 409, description = "Session is not over")
    )
)]
pub async fn play_again(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionActionResponse>, AppError> {
    Ok(Json(session_service::play_again(&state, id).await?))
}

/// Final summary of the run, including the player's personal bests.
#[utoipa::path(
    get,
    path = "/sessions/{id}/summary",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Run summary", body = SessionSummary),
        (status = 409, description = "Session is not over")
    )
)]
pub async fn session_summary(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSummary>, AppError> {
    Ok(Json(session_service::summary(&state, id).await?))
}
