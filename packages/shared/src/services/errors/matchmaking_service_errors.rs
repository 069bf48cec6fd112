use crate::repositories::errors::queue_repository_errors::QueueRepositoryError;
use crate::repositories::errors::room_repository_errors::RoomRepositoryError;

#[derive(Debug, PartialEq)]
pub enum MatchmakingServiceError {
    RepositoryError(QueueRepositoryError),
    RoomError(RoomRepositoryError),
    ValidationError(String),
}

impl std::fmt::Display for MatchmakingServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchmakingServiceError::RepositoryError(err) => {
                write!(f, "Repository error: {}", err)
            }
            MatchmakingServiceError::RoomError(err) => write!(f, "Room error: {}", err),
            MatchmakingServiceError::ValidationError(msg) => {
                write!(f, "Validation error: {}", msg)
            }
        }
    }
}

impl std::error::Error for MatchmakingServiceError {}

impl From<QueueRepositoryError> for MatchmakingServiceError {
    fn from(err: QueueRepositoryError) -> Self {
        MatchmakingServiceError::RepositoryError(err)
    }
}

impl From<RoomRepositoryError> for MatchmakingServiceError {
    fn from(err: RoomRepositoryError) -> Self {
        MatchmakingServiceError::RoomError(err)
    }
}
