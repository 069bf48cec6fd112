use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::models::game_room::ConnectionSender;
use crate::models::messages::ServerMessage;

/// One live socket owned by a player.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub connection_id: String,
    /// `None` for lobby connections.
    pub game_id: Option<String>,
    pub sender: ConnectionSender,
}

impl ConnectionHandle {
    pub fn is_lobby(&self) -> bool {
        self.game_id.is_none()
    }
}

#[async_trait]
pub trait WebSocketRepository: Send + Sync {
    async fn store_connection(
        &self,
        player_id: &str,
        handle: ConnectionHandle,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Returns the owner of the removed connection, if it was registered.
    async fn remove_connection_by_id(
        &self,
        connection_id: &str,
    ) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>>;

    async fn get_connections(
        &self,
        player_id: &str,
    ) -> Result<Vec<ConnectionHandle>, Box<dyn std::error::Error + Send + Sync>>;

    async fn send_message(
        &self,
        connection_id: &str,
        message: ServerMessage,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

#[derive(Default)]
struct Registry {
    by_player: HashMap<String, Vec<ConnectionHandle>>,
    owners: HashMap<String, String>,
}

#[derive(Default)]
pub struct InMemoryWebSocketRepository {
    registry: RwLock<Registry>,
}

impl InMemoryWebSocketRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WebSocketRepository for InMemoryWebSocketRepository {
    async fn store_connection(
        &self,
        player_id: &str,
        handle: ConnectionHandle,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut registry = self.registry.write().await;
        registry
            .owners
            .insert(handle.connection_id.clone(), player_id.to_string());
        let connections = registry.by_player.entry(player_id.to_string()).or_default();
        connections.retain(|c| c.connection_id != handle.connection_id);
        connections.push(handle);
        Ok(())
    }

    async fn remove_connection_by_id(
        &self,
        connection_id: &str,
    ) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>> {
        let mut registry = self.registry.write().await;
        let Some(player_id) = registry.owners.remove(connection_id) else {
            return Ok(None);
        };

        let now_offline = match registry.by_player.get_mut(&player_id) {
            Some(connections) => {
                connections.retain(|c| c.connection_id != connection_id);
                connections.is_empty()
            }
            None => false,
        };
        if now_offline {
            registry.by_player.remove(&player_id);
            debug!("Player {} has no live connections left", player_id);
        }
        Ok(Some(player_id))
    }

    async fn get_connections(
        &self,
        player_id: &str,
    ) -> Result<Vec<ConnectionHandle>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .registry
            .read()
            .await
            .by_player
            .get(player_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn send_message(
        &self,
        connection_id: &str,
        message: ServerMessage,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let registry = self.registry.read().await;
        let handle = registry
            .owners
            .get(connection_id)
            .and_then(|player_id| registry.by_player.get(player_id))
            .and_then(|connections| {
                connections
                    .iter()
                    .find(|c| c.connection_id == connection_id)
            })
            .ok_or_else(|| format!("Connection {} is not registered", connection_id))?;

        handle
            .sender
            .send(message)
            .map_err(|_| format!("Connection {} is closed", connection_id))?;
        info!("Sent message to connection: {}", connection_id);
        Ok(())
    }
}
