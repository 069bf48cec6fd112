#[derive(Debug, PartialEq)]
pub enum TournamentRepositoryError {
    AlreadyExists(String),
    NotFound(String),
    Storage(String),
}

impl std::fmt::Display for TournamentRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentRepositoryError::AlreadyExists(id) => {
                write!(f, "Tournament {} already exists", id)
            }
            TournamentRepositoryError::NotFound(id) => write!(f, "Tournament {} not found", id),
            TournamentRepositoryError::Storage(msg) => {
                write!(f, "Tournament storage error: {}", msg)
            }
        }
    }
}

impl std::error::Error for TournamentRepositoryError {}
