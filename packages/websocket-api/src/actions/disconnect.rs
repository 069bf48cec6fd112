use tracing::{error, info};

use shared::state::AppState;

use super::ConnectedSession;

/// Runs once per accepted socket when its loop ends. Safe after `giveUp`:
/// the room ignores connections that no longer decide anything.
pub async fn handle_disconnect(state: &AppState, session: &ConnectedSession) {
    info!(
        "WebSocket connection disconnected: {} ({})",
        session.connection_id, session.user_id
    );

    if let Some(game_id) = &session.game_id {
        state
            .game_room_service
            .disconnect(game_id, &session.connection_id)
            .await;
    }

    if let Err(e) = state
        .websocket_service
        .remove_connection_by_id(&session.connection_id)
        .await
    {
        error!(
            "Failed to remove connection {}: {}",
            session.connection_id, e
        );
    }
}
