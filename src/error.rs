//! Error types of the service layer and their HTTP rendering.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, state::session::SessionError};

/// Failure of a service operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No score store is installed (degraded mode).
    #[error("score store unavailable (degraded mode)")]
    Degraded,
    /// The installed score store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The session engine refused the operation in its current state.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Error returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// 400.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// 404.
    #[error("not found: {0}")]
    NotFound(String),
    /// 409: the session is in the wrong phase for the request.
    #[error("conflict: {0}")]
    Conflict(String),
    /// 503.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// 500. The details are logged, not returned.
    #[error("internal error")]
    Internal,
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {err}"))
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Storage(err @ StorageError::Unavailable { .. }) => {
                AppError::ServiceUnavailable(err.to_string())
            }
            ServiceError::Storage(err @ StorageError::Corrupt { .. }) => {
                error!(backend = err.backend(), error = %err, "score store returned unreadable data");
                AppError::Internal
            }
            ServiceError::Session(err) => AppError::Conflict(err.to_string()),
            ServiceError::NotFound(what) => AppError::NotFound(what),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            message: self.to_string(),
        });
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        review::ReviewError,
        state_machine::{InvalidTransition, SessionEvent, SessionPhase},
    };

    fn status_of(err: ServiceError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn engine_refusals_are_conflicts() {
        let transition = SessionError::from(InvalidTransition {
            from: SessionPhase::Over,
            event: SessionEvent::Start,
        });
        let review = SessionError::from(ReviewError::Finished);

        assert_eq!(status_of(transition.into()), StatusCode::CONFLICT);
        assert_eq!(status_of(review.into()), StatusCode::CONFLICT);
    }

    #[test]
    fn storage_failures_split_by_kind() {
        let offline = StorageError::unavailable("memory", std::io::Error::other("refused"));
        let garbled = StorageError::corrupt("memory", std::io::Error::other("bad document"));

        assert_eq!(status_of(ServiceError::Degraded), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_of(offline.into()), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_of(garbled.into()), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn missing_session_is_not_found() {
        assert_eq!(
            status_of(ServiceError::NotFound("session".into())),
            StatusCode::NOT_FOUND
        );
    }
}
