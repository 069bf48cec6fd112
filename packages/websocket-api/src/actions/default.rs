use tracing::{debug, warn};

use shared::models::messages::{ClientMessage, ServerMessage};
use shared::state::AppState;

use super::ConnectedSession;

/// Routes one text frame from an accepted socket. Nothing here closes the
/// connection: malformed payloads are logged and dropped, rule violations are
/// answered with an `error` message.
pub async fn handle_default_message(state: &AppState, session: &ConnectedSession, body: &str) {
    let message: ClientMessage = match serde_json::from_str(body) {
        Ok(message) => message,
        Err(e) => {
            warn!(
                "Dropping malformed message from connection {}: {}",
                session.connection_id, e
            );
            return;
        }
    };

    let Some(game_id) = session.game_id.as_deref() else {
        debug!(
            "Lobby connection {} sent {}, ignoring",
            session.connection_id,
            message.kind()
        );
        reply(session, ServerMessage::error("Not connected to a game"));
        return;
    };

    if let Err(e) = state
        .game_room_service
        .handle_message(game_id, &session.connection_id, message)
        .await
    {
        reply(session, ServerMessage::error(e.to_string()));
    }
}

fn reply(session: &ConnectedSession, message: ServerMessage) {
    if session.sender.send(message).is_err() {
        debug!(
            "Connection {} is gone, reply discarded",
            session.connection_id
        );
    }
}
