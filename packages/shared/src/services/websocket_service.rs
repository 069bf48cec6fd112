use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::messages::ServerMessage;
use crate::repositories::websocket_repository::{ConnectionHandle, WebSocketRepository};

/// Connection registry facade: presence plus push delivery to lobby sockets.
#[derive(Clone)]
pub struct WebSocketService {
    repository: Arc<dyn WebSocketRepository>,
}

impl WebSocketService {
    pub fn new(repository: Arc<dyn WebSocketRepository>) -> Self {
        Self { repository }
    }

    pub async fn store_connection(
        &self,
        player_id: &str,
        handle: ConnectionHandle,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!(
            "Storing WebSocket connection {} for player: {}",
            handle.connection_id, player_id
        );
        self.repository.store_connection(player_id, handle).await
    }

    pub async fn remove_connection_by_id(
        &self,
        connection_id: &str,
    ) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>> {
        info!("Removing WebSocket connection by ID: {}", connection_id);
        self.repository.remove_connection_by_id(connection_id).await
    }

    pub async fn is_online(
        &self,
        player_id: &str,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(!self.repository.get_connections(player_id).await?.is_empty())
    }

    /// Pushes `message` to every lobby connection of the player. Returns how
    /// many sockets it reached; an offline player is not an error.
    pub async fn send_notification(
        &self,
        player_id: &str,
        message: ServerMessage,
    ) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        let lobby: Vec<ConnectionHandle> = self
            .repository
            .get_connections(player_id)
            .await?
            .into_iter()
            .filter(ConnectionHandle::is_lobby)
            .collect();

        if lobby.is_empty() {
            info!(
                "Player {} is not connected, skipping notification",
                player_id
            );
            return Ok(0);
        }

        let mut delivered = 0;
        for handle in lobby {
            match self
                .repository
                .send_message(&handle.connection_id, message.clone())
                .await
            {
                Ok(()) => delivered += 1,
                Err(e) => warn!(
                    "Failed to notify player {} on {}: {}",
                    player_id, handle.connection_id, e
                ),
            }
        }
        debug!("Notified player {} on {} connection(s)", player_id, delivered);
        Ok(delivered)
    }
}
