use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use shared::models::auth::responses::ErrorResponse;
use shared::models::tournament::BracketError;
use shared::services::errors::{
    auth_service_errors::AuthServiceError, matchmaking_service_errors::MatchmakingServiceError,
    tournament_service_errors::TournamentServiceError,
};

#[derive(Debug)]
pub enum ApiError {
    AuthService(AuthServiceError),
    MatchmakingService(MatchmakingServiceError),
    TournamentService(TournamentServiceError),
    Unauthorized,
}

impl From<AuthServiceError> for ApiError {
    fn from(error: AuthServiceError) -> Self {
        ApiError::AuthService(error)
    }
}

impl From<MatchmakingServiceError> for ApiError {
    fn from(error: MatchmakingServiceError) -> Self {
        ApiError::MatchmakingService(error)
    }
}

impl From<TournamentServiceError> for ApiError {
    fn from(error: TournamentServiceError) -> Self {
        ApiError::TournamentService(error)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::AuthService(AuthServiceError::ValidationError(_)) => StatusCode::BAD_REQUEST,
            ApiError::AuthService(AuthServiceError::JwtError(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::AuthService(
                AuthServiceError::MissingToken
                | AuthServiceError::InvalidToken
                | AuthServiceError::ExpiredToken,
            ) => StatusCode::UNAUTHORIZED,

            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,

            ApiError::MatchmakingService(MatchmakingServiceError::ValidationError(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::MatchmakingService(
                MatchmakingServiceError::RepositoryError(_) | MatchmakingServiceError::RoomError(_),
            ) => StatusCode::INTERNAL_SERVER_ERROR,

            ApiError::TournamentService(
                TournamentServiceError::TournamentNotFound(_)
                | TournamentServiceError::MatchNotFound(_),
            ) => StatusCode::NOT_FOUND,
            ApiError::TournamentService(TournamentServiceError::Bracket(err)) => match err {
                BracketError::InvalidName
                | BracketError::InvalidSize(_)
                | BracketError::InvalidRound(_)
                | BracketError::InvalidWinner
                | BracketError::InvalidScores => StatusCode::BAD_REQUEST,
                BracketError::NotAParticipant => StatusCode::FORBIDDEN,
                BracketError::MatchNotFound(_) => StatusCode::NOT_FOUND,
                BracketError::AlreadyStarted
                | BracketError::Full
                | BracketError::AlreadyJoined
                | BracketError::NotFull
                | BracketError::RoundIncomplete(_)
                | BracketError::MatchCompleted => StatusCode::CONFLICT,
            },
            ApiError::TournamentService(
                TournamentServiceError::RepositoryError(_) | TournamentServiceError::RoomError(_),
            ) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::AuthService(err) => err.to_string(),
            ApiError::MatchmakingService(err) => err.to_string(),
            ApiError::TournamentService(err) => err.to_string(),
            ApiError::Unauthorized => "Unauthorized".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self.message());
        }

        (
            status,
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}
