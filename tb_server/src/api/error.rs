//! Mapping of tournament errors onto HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tourney_bracket::tournament::TournamentError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error returned by every tournament handler
#[derive(Debug)]
pub enum ApiError {
    Tournament(TournamentError),
    /// Malformed request the manager never saw
    BadRequest(String),
}

impl From<TournamentError> for ApiError {
    fn from(err: TournamentError) -> Self {
        ApiError::Tournament(err)
    }
}

/// HTTP status for a tournament error
pub fn status_for(err: &TournamentError) -> StatusCode {
    use TournamentError::*;

    match err {
        NotFound { .. } => StatusCode::NOT_FOUND,
        AlreadyJoined(_)
        | TournamentFull
        | RegistrationClosed
        | CannotLeaveAfterStart
        | BracketAlreadyGenerated
        | BracketNotGenerated
        | MatchNotReady(_)
        | MatchAlreadyCompleted(_)
        | TournamentCompleted
        | PairingConfirmationRequired
        | InvalidStatusTransition { .. } => StatusCode::CONFLICT,
        InvalidScore(_)
        | TiedScore(_)
        | InsufficientEntrants(_)
        | PairingGenerationFailed(_)
        | InvalidConfig(_)
        | InvalidSeeding(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Retryable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        Store(_) if err.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
        Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Tournament(err) => {
                let status = status_for(&err);
                if status.is_server_error() {
                    tracing::error!(error = %err, "Tournament operation failed");
                } else {
                    tracing::debug!(error = %err, "Tournament request rejected");
                }
                (status, err.client_message())
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
