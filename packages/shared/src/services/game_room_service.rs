use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::models::auth::AuthenticatedIdentity;
use crate::models::game_room::{AttachError, RoomConnection};
use crate::models::game_session::{FinishReason, MatchRecord, Side};
use crate::models::messages::ClientMessage;
use crate::models::tournament::PlayerScore;
use crate::repositories::match_result_repository::MatchResultRepository;
use crate::repositories::room_repository::GameRoomRepository;
use crate::services::errors::game_room_service_errors::GameRoomServiceError;
use crate::services::tournament_service::TournamentService;

/// Drives rooms on behalf of socket handlers. Room locks are released before
/// results are handed to the bracket or the stats store.
#[derive(Clone)]
pub struct GameRoomService {
    rooms: Arc<dyn GameRoomRepository + Send + Sync>,
    results: Arc<dyn MatchResultRepository + Send + Sync>,
    tournament_service: Arc<TournamentService>,
}

impl GameRoomService {
    pub fn new(
        rooms: Arc<dyn GameRoomRepository + Send + Sync>,
        results: Arc<dyn MatchResultRepository + Send + Sync>,
        tournament_service: Arc<TournamentService>,
    ) -> Self {
        GameRoomService {
            rooms,
            results,
            tournament_service,
        }
    }

    /// Seats the connection in the room for `game_id`, creating the room on
    /// first contact.
    pub async fn connect(
        &self,
        game_id: &str,
        player: &AuthenticatedIdentity,
        connection: RoomConnection,
    ) -> Result<Side, GameRoomServiceError> {
        if game_id.trim().is_empty() {
            return Err(GameRoomServiceError::ValidationError(
                "Game id cannot be empty".to_string(),
            ));
        }

        loop {
            let room = self.rooms.get_or_create_room(game_id).await;
            let mut room = room.lock().await;
            match room.attach(player.clone(), connection.clone()) {
                Ok(outcome) => {
                    info!(
                        "Player {} joined game {} on the {} side",
                        player.user_id, game_id, outcome.side
                    );
                    return Ok(outcome.side);
                }
                // Lost a race with room removal; the registry hands out a
                // fresh room on the next pass.
                Err(AttachError::Closed) => {
                    drop(room);
                    tokio::task::yield_now().await;
                }
                Err(e) => {
                    info!(
                        "Rejected player {} from game {}: {}",
                        player.user_id, game_id, e
                    );
                    return Err(e.into());
                }
            }
        }
    }

    pub async fn handle_message(
        &self,
        game_id: &str,
        connection_id: &str,
        message: ClientMessage,
    ) -> Result<(), GameRoomServiceError> {
        let room = self
            .rooms
            .get_room(game_id)
            .await
            .ok_or_else(|| GameRoomServiceError::RoomNotFound(game_id.to_string()))?;

        let kind = message.kind();
        let record = {
            let mut room = room.lock().await;
            room.handle_message(connection_id, message)
        }
        .map_err(|e| {
            debug!(
                "Dropped {} from {} in game {}: {}",
                kind, connection_id, game_id, e
            );
            GameRoomServiceError::from(e)
        })?;

        if let Some(record) = record {
            self.record_outcome(record).await;
        }
        Ok(())
    }

    /// Idempotent: a connection that was already removed or displaced changes
    /// nothing.
    pub async fn disconnect(&self, game_id: &str, connection_id: &str) {
        let Some(room) = self.rooms.get_room(game_id).await else {
            return;
        };

        let record = room.lock().await.detach(connection_id);
        if let Some(record) = record {
            self.record_outcome(record).await;
        }

        if self.rooms.remove_room_if_empty(game_id).await {
            info!("Game room {} closed", game_id);
        }
    }

    /// Tournament bookkeeping first, then stats. Neither failure undoes the
    /// result the room already announced.
    async fn record_outcome(&self, record: MatchRecord) {
        info!(
            "Game {} finished: {} beat {} ({}-{}, {:?})",
            record.game_id,
            record.winner_id,
            record.loser_id,
            record.left_score,
            record.right_score,
            record.reason
        );

        if let Some(match_id) = &record.match_id {
            let scores = [
                PlayerScore {
                    user_id: record.winner_id.clone(),
                    score: record.score_for(&record.winner_id),
                },
                PlayerScore {
                    user_id: record.loser_id.clone(),
                    score: record.score_for(&record.loser_id),
                },
            ];
            match self
                .tournament_service
                .report_match_result(
                    match_id,
                    &record.winner_id,
                    &record.winner_id,
                    &scores,
                    record.reason == FinishReason::Forfeit,
                )
                .await
            {
                Ok(report) if report.duplicate => {
                    info!("Tournament match {} was already reported", match_id)
                }
                Ok(_) => debug!("Reported tournament match {}", match_id),
                Err(e) => error!("Failed to report tournament match {}: {}", match_id, e),
            }
        }

        if let Err(e) = self.results.record_result(&record).await {
            warn!(
                "Stats update failed for game {}, result stands: {}",
                record.game_id, e
            );
        }
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.room_count().await
    }
}
