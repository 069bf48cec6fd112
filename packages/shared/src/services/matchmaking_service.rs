use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::game_room::RoomKind;
use crate::models::matchmaking::{
    CommitOutcome, JoinOutcome, MatchmakingStatus, Pairing, QueueInsert, WaitingEntry,
};
use crate::models::messages::ServerMessage;
use crate::repositories::queue_repository::QueueRepository;
use crate::repositories::room_repository::GameRoomRepository;
use crate::services::errors::matchmaking_service_errors::MatchmakingServiceError;
use crate::services::websocket_service::WebSocketService;

#[derive(Clone)]
pub struct MatchmakingService {
    repository: Arc<dyn QueueRepository + Send + Sync>,
    rooms: Arc<dyn GameRoomRepository + Send + Sync>,
    websocket_service: Arc<WebSocketService>,
}

impl MatchmakingService {
    pub fn new(
        repository: Arc<dyn QueueRepository + Send + Sync>,
        rooms: Arc<dyn GameRoomRepository + Send + Sync>,
        websocket_service: Arc<WebSocketService>,
    ) -> Self {
        MatchmakingService {
            repository,
            rooms,
            websocket_service,
        }
    }

    /// Pairs the player with the longest-waiting opponent, or queues them.
    ///
    /// A lost race on the chosen opponent is retried against the current
    /// queue; it is never surfaced to the caller.
    pub async fn join(&self, player_id: &str) -> Result<JoinOutcome, MatchmakingServiceError> {
        validate_player_id(player_id)?;
        self.dissolve(player_id).await?;

        loop {
            let opponents = self.repository.find_potential_opponents(player_id).await?;

            let Some(opponent) = self.select_best_opponent(&opponents) else {
                match self
                    .repository
                    .join_queue(&WaitingEntry::new(player_id))
                    .await?
                {
                    QueueInsert::Inserted => {
                        info!("Player {} is waiting for an opponent", player_id);
                        return Ok(JoinOutcome::Waiting);
                    }
                    QueueInsert::AlreadyPaired(pairing) => {
                        return Ok(JoinOutcome::Matched(pairing));
                    }
                    QueueInsert::OpponentAvailable => {
                        debug!("Opponent appeared while {} was queueing, rescanning", player_id);
                        tokio::task::yield_now().await;
                        continue;
                    }
                }
            };

            let Some(reservation) = self
                .repository
                .check_and_reserve_opponent(&opponent)
                .await?
            else {
                debug!(
                    "Opponent {} was claimed by another pairing, retrying for {}",
                    opponent.player_id, player_id
                );
                tokio::task::yield_now().await;
                continue;
            };

            let game_id = Uuid::new_v4().to_string();
            let outcome = match self
                .repository
                .create_game_session(player_id, &reservation, &game_id)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    if let Err(release_error) =
                        self.repository.release_reservation(&reservation).await
                    {
                        warn!(
                            "Failed to release reservation on {}: {}",
                            reservation.player_id, release_error
                        );
                    }
                    return Err(e.into());
                }
            };

            match outcome {
                CommitOutcome::Committed => {
                    return self
                        .open_matched_room(player_id, &opponent.player_id, game_id)
                        .await;
                }
                CommitOutcome::AlreadyPaired(pairing) => {
                    return Ok(JoinOutcome::Matched(pairing));
                }
                CommitOutcome::OpponentGone => {
                    debug!(
                        "Opponent {} left before pairing with {}, retrying",
                        opponent.player_id, player_id
                    );
                    tokio::task::yield_now().await;
                }
            }
        }
    }

    pub async fn leave(&self, player_id: &str) -> Result<(), MatchmakingServiceError> {
        validate_player_id(player_id)?;
        self.dissolve(player_id).await?;
        info!("Player {} left matchmaking", player_id);
        Ok(())
    }

    /// Takes the player out of the queue. A room opened for a pairing they
    /// were part of goes too, unless someone is connected to it or it still
    /// owes a result.
    async fn dissolve(&self, player_id: &str) -> Result<(), MatchmakingServiceError> {
        if let Some(pairing) = self.repository.remove_player(player_id).await? {
            if self.rooms.remove_room_if_empty(&pairing.game_id).await {
                debug!(
                    "Dropped room {} of dissolved pairing {} vs {}",
                    pairing.game_id, player_id, pairing.opponent_id
                );
            }
        }
        Ok(())
    }

    pub async fn status(&self, player_id: &str) -> Result<MatchmakingStatus, MatchmakingServiceError> {
        validate_player_id(player_id)?;
        if let Some(pairing) = self.repository.get_pairing(player_id).await? {
            return Ok(MatchmakingStatus::Matched(pairing));
        }
        if self.repository.is_waiting(player_id).await? {
            return Ok(MatchmakingStatus::Waiting);
        }
        Ok(MatchmakingStatus::NotQueued)
    }

    fn select_best_opponent(&self, opponents: &[WaitingEntry]) -> Option<WaitingEntry> {
        opponents
            .iter()
            .min_by_key(|opponent| opponent.joined_at)
            .cloned()
    }

    async fn open_matched_room(
        &self,
        player_id: &str,
        opponent_id: &str,
        game_id: String,
    ) -> Result<JoinOutcome, MatchmakingServiceError> {
        self.rooms
            .open_room(
                &game_id,
                RoomKind::Matchmaking,
                Some([opponent_id.to_string(), player_id.to_string()]),
            )
            .await?;
        info!(
            "Paired {} with {} in game {}",
            player_id, opponent_id, game_id
        );

        let notification = ServerMessage::MatchFound {
            game_id: game_id.clone(),
            opponent_id: player_id.to_string(),
        };
        if let Err(e) = self
            .websocket_service
            .send_notification(opponent_id, notification)
            .await
        {
            warn!("Failed to notify {} about game {}: {}", opponent_id, game_id, e);
        }

        Ok(JoinOutcome::Matched(Pairing {
            game_id,
            opponent_id: opponent_id.to_string(),
            matched_at: chrono::Utc::now(),
        }))
    }
}

fn validate_player_id(player_id: &str) -> Result<(), MatchmakingServiceError> {
    if player_id.trim().is_empty() {
        return Err(MatchmakingServiceError::ValidationError(
            "Player id cannot be empty".to_string(),
        ));
    }
    Ok(())
}
