use crate::models::game_room::{AttachError, RoomMessageError};

#[derive(Debug, PartialEq)]
pub enum GameRoomServiceError {
    RoomFull,
    NotAParticipant,
    RoomNotFound(String),
    InvalidMessage(RoomMessageError),
    ValidationError(String),
}

impl std::fmt::Display for GameRoomServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameRoomServiceError::RoomFull => write!(f, "Room is full"),
            GameRoomServiceError::NotAParticipant => {
                write!(f, "Not a participant of this game")
            }
            GameRoomServiceError::RoomNotFound(game_id) => {
                write!(f, "Game room {} not found", game_id)
            }
            GameRoomServiceError::InvalidMessage(err) => write!(f, "{}", err),
            GameRoomServiceError::ValidationError(msg) => {
                write!(f, "Validation error: {}", msg)
            }
        }
    }
}

impl std::error::Error for GameRoomServiceError {}

impl From<RoomMessageError> for GameRoomServiceError {
    fn from(err: RoomMessageError) -> Self {
        GameRoomServiceError::InvalidMessage(err)
    }
}

impl From<AttachError> for GameRoomServiceError {
    fn from(err: AttachError) -> Self {
        match err {
            AttachError::RoomFull | AttachError::Closed => GameRoomServiceError::RoomFull,
            AttachError::NotAParticipant => GameRoomServiceError::NotAParticipant,
        }
    }
}
