#[derive(Debug, PartialEq)]
pub enum RoomRepositoryError {
    AlreadyExists(String),
}

impl std::fmt::Display for RoomRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomRepositoryError::AlreadyExists(game_id) => {
                write!(f, "Game room {} already exists", game_id)
            }
        }
    }
}

impl std::error::Error for RoomRepositoryError {}
