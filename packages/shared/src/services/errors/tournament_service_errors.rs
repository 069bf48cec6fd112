use crate::models::tournament::BracketError;
use crate::repositories::errors::room_repository_errors::RoomRepositoryError;
use crate::repositories::errors::tournament_repository_errors::TournamentRepositoryError;

#[derive(Debug, PartialEq)]
pub enum TournamentServiceError {
    TournamentNotFound(String),
    MatchNotFound(String),
    Bracket(BracketError),
    RepositoryError(TournamentRepositoryError),
    RoomError(RoomRepositoryError),
}

impl std::fmt::Display for TournamentServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentServiceError::TournamentNotFound(id) => {
                write!(f, "Tournament {} not found", id)
            }
            TournamentServiceError::MatchNotFound(id) => write!(f, "Match {} not found", id),
            TournamentServiceError::Bracket(err) => write!(f, "{}", err),
            TournamentServiceError::RepositoryError(err) => {
                write!(f, "Repository error: {}", err)
            }
            TournamentServiceError::RoomError(err) => write!(f, "Room error: {}", err),
        }
    }
}

impl std::error::Error for TournamentServiceError {}

impl From<BracketError> for TournamentServiceError {
    fn from(err: BracketError) -> Self {
        match err {
            BracketError::MatchNotFound(id) => TournamentServiceError::MatchNotFound(id),
            other => TournamentServiceError::Bracket(other),
        }
    }
}

impl From<TournamentRepositoryError> for TournamentServiceError {
    fn from(err: TournamentRepositoryError) -> Self {
        match err {
            TournamentRepositoryError::NotFound(id) => TournamentServiceError::TournamentNotFound(id),
            other => TournamentServiceError::RepositoryError(other),
        }
    }
}

impl From<RoomRepositoryError> for TournamentServiceError {
    fn from(err: RoomRepositoryError) -> Self {
        TournamentServiceError::RoomError(err)
    }
}
