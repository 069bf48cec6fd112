#[derive(Debug, PartialEq)]
pub enum QueueRepositoryError {
    InvalidPlayer(String),
    Storage(String),
}

impl std::fmt::Display for QueueRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueRepositoryError::InvalidPlayer(player_id) => {
                write!(f, "Invalid player id: '{}'", player_id)
            }
            QueueRepositoryError::Storage(msg) => write!(f, "Queue storage error: {}", msg),
        }
    }
}

impl std::error::Error for QueueRepositoryError {}
