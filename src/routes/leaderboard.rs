use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use axum_valid::Valid;

use crate::{
    dto::{
        leaderboard::{LeaderboardResponse, LimitQuery, PersonalBestResponse},
        validation::validate_user_id,
    },
    error::AppError,
    services::leaderboard_service,
    state::SharedState,
};

/// Ranking endpoints backed by the score store.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/leaderboard", get(leaderboard))
        .route("/players/{id}/best", get(personal_best))
}

/// Best score of each player, highest first.
#[utoipa::path(
    get,
    path = "/leaderboard",
    tag = "leaderboard",
    params(LimitQuery),
    responses(
        (status = 200, description = "Top entries", body = LeaderboardResponse),
        (status = 503, description = "Score store unavailable")
    )
)]
pub async fn leaderboard(
    State(state): State<SharedState>,
    Valid(Query(query)): Valid<Query<LimitQuery>>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    Ok(Json(
        leaderboard_service::top_entries(&state, query.limit).await?,
    ))
}

/// Best persisted runs of one player.
#[utoipa::path(
    get,
    path = "/players/{id}/best",
    tag = "leaderboard",
    params(
        ("id" = String, Path, description = "Player identifier"),
        LimitQuery
    ),
    responses(
        (status = 200, description = "Personal top scores", body = PersonalBestResponse),
        (status = 400, description = "Malformed player identifier"),
        (status = 503, description = "Score store unavailable")
    )
)]
pub async fn personal_best(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Valid(Query(query)): Valid<Query<LimitQuery>>,
) -> Result<Json<PersonalBestResponse>, AppError> {
    validate_user_id(&id).map_err(|_| AppError::BadRequest(format!("invalid player id `{id}`")))?;
    Ok(Json(
        leaderboard_service::personal_best(&state, id, query.limit).await?,
    ))
}
