use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Collocation Dash Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sessions::create_session,
        crate::routes::sessions::get_session,
        crate::routes::sessions::delete_session,
        crate::routes::sessions::start_session,
        crate::routes::sessions::arm_verb,
        crate::routes::sessions::arm_phrase,
        crate::routes::sessions::end_session,
        crate::routes::sessions::answer_review,
        crate::routes::sessions::next_review,
        crate::routes::sessions::skip_review,
        crate::routes::sessions::play_again,
        crate::routes::sessions::session_summary,
        crate::routes::leaderboard::leaderboard,
        crate::routes::leaderboard::personal_best,
        crate::routes::sse::session_stream,
        crate::routes::sse::leaderboard_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::session::CreateSessionRequest,
            crate::dto::session::PlayerInput,
            crate::dto::session::VerbRequest,
            crate::dto::session::PhraseRequest,
            crate::dto::session::SessionView,
            crate::dto::session::MoveResponse,
            crate::dto::session::SessionActionResponse,
            crate::dto::session::ReviewAnswerResponse,
            crate::dto::session::SessionSummary,
            crate::dto::leaderboard::LeaderboardResponse,
            crate::dto::leaderboard::PersonalBestResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::CueEvent,
            crate::dto::sse::LeaderboardUpdatedEvent,
            crate::dto::sse::SystemStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sessions", description = "Game session lifecycle and moves"),
        (name = "review", description = "Post-game review of mistakes"),
        (name = "leaderboard", description = "Global and personal rankings"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
