use serde::Deserialize;
use tracing::{error, info, warn};

use shared::models::game_room::{ConnectionSender, RoomConnection};
use shared::repositories::websocket_repository::ConnectionHandle;
use shared::services::auth_service::AuthServiceTrait;
use shared::services::errors::game_room_service_errors::GameRoomServiceError;
use shared::state::AppState;

use super::ConnectedSession;

pub const CLOSE_BAD_REQUEST: u16 = 4000;
pub const CLOSE_UNAUTHORIZED: u16 = 4001;
pub const CLOSE_ROOM_FULL: u16 = 4003;
pub const CLOSE_NOT_A_PARTICIPANT: u16 = 4004;
pub const CLOSE_INTERNAL_ERROR: u16 = 1011;

#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    pub token: Option<String>,
    #[serde(rename = "gameId")]
    pub game_id: Option<String>,
}

/// Why a socket was refused before entering its message loop.
#[derive(Debug, PartialEq)]
pub enum ConnectionRejection {
    Unauthorized(String),
    RoomFull,
    NotAParticipant,
    BadRequest(String),
    Internal(String),
}

impl ConnectionRejection {
    pub fn close_code(&self) -> u16 {
        match self {
            ConnectionRejection::Unauthorized(_) => CLOSE_UNAUTHORIZED,
            ConnectionRejection::RoomFull => CLOSE_ROOM_FULL,
            ConnectionRejection::NotAParticipant => CLOSE_NOT_A_PARTICIPANT,
            ConnectionRejection::BadRequest(_) => CLOSE_BAD_REQUEST,
            ConnectionRejection::Internal(_) => CLOSE_INTERNAL_ERROR,
        }
    }
}

impl std::fmt::Display for ConnectionRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionRejection::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ConnectionRejection::RoomFull => write!(f, "Room is full"),
            ConnectionRejection::NotAParticipant => {
                write!(f, "Not a participant of this game")
            }
            ConnectionRejection::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ConnectionRejection::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ConnectionRejection {}

impl From<GameRoomServiceError> for ConnectionRejection {
    fn from(err: GameRoomServiceError) -> Self {
        match err {
            GameRoomServiceError::RoomFull => ConnectionRejection::RoomFull,
            GameRoomServiceError::NotAParticipant => ConnectionRejection::NotAParticipant,
            GameRoomServiceError::ValidationError(msg) => ConnectionRejection::BadRequest(msg),
            other => ConnectionRejection::Internal(other.to_string()),
        }
    }
}

/// Authenticates the socket, seats it in its room when `gameId` is given and
/// registers it for presence and notifications.
pub async fn handle_connect(
    state: &AppState,
    params: &ConnectParams,
    connection_id: &str,
    sender: ConnectionSender,
) -> Result<ConnectedSession, ConnectionRejection> {
    let token = params
        .token
        .as_deref()
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ConnectionRejection::Unauthorized("Missing token".to_string()))?;

    let identity = state.auth_service.authenticate(token).map_err(|e| {
        warn!("Rejected connection {}: {}", connection_id, e);
        ConnectionRejection::Unauthorized(e.to_string())
    })?;

    let game_id = match params.game_id.as_deref() {
        Some(game_id) if game_id.trim().is_empty() => {
            return Err(ConnectionRejection::BadRequest(
                "gameId cannot be empty".to_string(),
            ));
        }
        Some(game_id) => {
            state
                .game_room_service
                .connect(
                    game_id,
                    &identity,
                    RoomConnection::new(connection_id, sender.clone()),
                )
                .await?;
            Some(game_id.to_string())
        }
        None => None,
    };

    let handle = ConnectionHandle {
        connection_id: connection_id.to_string(),
        game_id: game_id.clone(),
        sender: sender.clone(),
    };
    if let Err(e) = state
        .websocket_service
        .store_connection(&identity.user_id, handle)
        .await
    {
        error!("Failed to store connection {}: {}", connection_id, e);
        if let Some(game_id) = &game_id {
            state
                .game_room_service
                .disconnect(game_id, connection_id)
                .await;
        }
        return Err(ConnectionRejection::Internal(
            "Failed to store connection".to_string(),
        ));
    }

    info!(
        "WebSocket connection {} established for {} ({})",
        connection_id,
        identity.user_id,
        game_id.as_deref().unwrap_or("lobby")
    );

    Ok(ConnectedSession {
        connection_id: connection_id.to_string(),
        user_id: identity.user_id,
        game_id,
        sender,
    })
}
