use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::game_room::RoomKind;
use crate::models::messages::ServerMessage;
use crate::models::tournament::{
    Advancement, BracketError, PlayerScore, ReadyOutcome, ResultOutcome, RoundGeneration,
    Tournament, TournamentMatch,
};
use crate::repositories::room_repository::GameRoomRepository;
use crate::repositories::tournament_repository::TournamentRepository;
use crate::services::errors::tournament_service_errors::TournamentServiceError;
use crate::services::websocket_service::WebSocketService;

/// What a bracket edit did to the stored copy.
enum Mutation<T> {
    Changed(T),
    Unchanged(T),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchReport {
    pub duplicate: bool,
    pub advancement: Option<Advancement>,
}

#[derive(Clone)]
pub struct TournamentService {
    repository: Arc<dyn TournamentRepository + Send + Sync>,
    rooms: Arc<dyn GameRoomRepository + Send + Sync>,
    websocket_service: Arc<WebSocketService>,
}

impl TournamentService {
    pub fn new(
        repository: Arc<dyn TournamentRepository + Send + Sync>,
        rooms: Arc<dyn GameRoomRepository + Send + Sync>,
        websocket_service: Arc<WebSocketService>,
    ) -> Self {
        TournamentService {
            repository,
            rooms,
            websocket_service,
        }
    }

    pub async fn create_tournament(
        &self,
        name: &str,
        size: usize,
        start_date: DateTime<Utc>,
    ) -> Result<Tournament, TournamentServiceError> {
        let tournament = Tournament::new(name, size, start_date)?;
        self.repository.create_tournament(&tournament).await?;
        info!(
            "Created tournament {} ({}, {} players)",
            tournament.tournament_id, tournament.name, tournament.size
        );
        Ok(tournament)
    }

    pub async fn get_tournament(
        &self,
        tournament_id: &str,
    ) -> Result<Tournament, TournamentServiceError> {
        self.repository
            .get_tournament(tournament_id)
            .await?
            .ok_or_else(|| TournamentServiceError::TournamentNotFound(tournament_id.to_string()))
    }

    /// Registers the player; the join that fills the bracket also generates
    /// round one in the same write.
    pub async fn join_tournament(
        &self,
        tournament_id: &str,
        user_id: &str,
    ) -> Result<Tournament, TournamentServiceError> {
        let (_, tournament) = self
            .modify(tournament_id, |tournament| {
                if tournament.add_player(user_id)? {
                    tournament.generate_round(1, &mut rand::thread_rng())?;
                }
                Ok(Mutation::Changed(()))
            })
            .await?;

        info!("Player {} joined tournament {}", user_id, tournament_id);
        if tournament.is_full() {
            info!("Tournament {} is full, round 1 generated", tournament_id);
        }
        Ok(tournament)
    }

    pub async fn generate_round(
        &self,
        tournament_id: &str,
        round_number: u32,
    ) -> Result<RoundGeneration, TournamentServiceError> {
        let (generation, _) = self
            .modify(tournament_id, |tournament| {
                match tournament.generate_round(round_number, &mut rand::thread_rng())? {
                    generated @ RoundGeneration::Generated(_) => Ok(Mutation::Changed(generated)),
                    existing => Ok(Mutation::Unchanged(existing)),
                }
            })
            .await?;
        Ok(generation)
    }

    /// Records a readiness signal. The call that sees both players ready opens
    /// the game room and notifies both of them; every other call only reports
    /// the current state.
    pub async fn mark_ready(
        &self,
        match_id: &str,
        user_id: &str,
    ) -> Result<ReadyOutcome, TournamentServiceError> {
        let tournament_id = self.tournament_of_match(match_id).await?;
        let candidate_game_id = Uuid::new_v4().to_string();

        let (outcome, tournament) = self
            .modify(&tournament_id, |tournament| {
                let before = tournament.find_match(match_id).cloned();
                let outcome = tournament.mark_ready(match_id, user_id, &candidate_game_id)?;
                if tournament.find_match(match_id).cloned() == before {
                    Ok(Mutation::Unchanged(outcome))
                } else {
                    Ok(Mutation::Changed(outcome))
                }
            })
            .await?;

        if outcome.session_created {
            let game = tournament
                .find_match(match_id)
                .cloned()
                .ok_or_else(|| TournamentServiceError::MatchNotFound(match_id.to_string()))?;
            self.open_match_room(&tournament_id, &game, &candidate_game_id)
                .await?;
        } else {
            debug!(
                "Player {} ready for match {}, waiting for opponent",
                user_id, match_id
            );
        }
        Ok(outcome)
    }

    /// Single write point for match outcomes. `reported_by` must be one of the
    /// match players. A report for a completed match is acknowledged as a
    /// duplicate and changes nothing.
    pub async fn report_match_result(
        &self,
        match_id: &str,
        reported_by: &str,
        winner_id: &str,
        scores: &[PlayerScore],
        forfeit: bool,
    ) -> Result<MatchReport, TournamentServiceError> {
        let tournament_id = self.tournament_of_match(match_id).await?;

        let (outcome, _) = self
            .modify(&tournament_id, |tournament| {
                match tournament.record_result(match_id, reported_by, winner_id, scores, forfeit)? {
                    ResultOutcome::Duplicate => Ok(Mutation::Unchanged(ResultOutcome::Duplicate)),
                    recorded => Ok(Mutation::Changed(recorded)),
                }
            })
            .await?;

        match outcome {
            ResultOutcome::Duplicate => {
                info!("Ignoring duplicate result for match {}", match_id);
                Ok(MatchReport {
                    duplicate: true,
                    advancement: None,
                })
            }
            ResultOutcome::Recorded { round_number } => {
                info!(
                    "Recorded result for match {}: winner {}",
                    match_id, winner_id
                );
                let advancement = self
                    .advance_if_round_complete(&tournament_id, round_number)
                    .await?;
                Ok(MatchReport {
                    duplicate: false,
                    advancement: Some(advancement),
                })
            }
        }
    }

    /// Generates the next round or crowns the champion once every match of
    /// `round_number` is completed. Concurrent callers race on the stored
    /// version, so the transition happens once.
    pub async fn advance_if_round_complete(
        &self,
        tournament_id: &str,
        round_number: u32,
    ) -> Result<Advancement, TournamentServiceError> {
        let (advancement, _) = self
            .modify(tournament_id, |tournament| {
                match tournament.advance_if_round_complete(round_number, &mut rand::thread_rng())? {
                    advanced @ (Advancement::NextRound(_) | Advancement::Completed { .. }) => {
                        Ok(Mutation::Changed(advanced))
                    }
                    other => Ok(Mutation::Unchanged(other)),
                }
            })
            .await?;

        match &advancement {
            Advancement::NextRound(next) => {
                info!("Tournament {} advanced to round {}", tournament_id, next)
            }
            Advancement::Completed { champion_id } => {
                info!("Tournament {} won by {}", tournament_id, champion_id)
            }
            Advancement::Pending | Advancement::AlreadyAdvanced => {}
        }
        Ok(advancement)
    }

    pub async fn get_upcoming_matches(
        &self,
        tournament_id: &str,
    ) -> Result<Vec<TournamentMatch>, TournamentServiceError> {
        Ok(self.get_tournament(tournament_id).await?.upcoming_matches())
    }

    pub async fn list_tournaments(&self) -> Result<Vec<Tournament>, TournamentServiceError> {
        Ok(self.repository.list_tournaments().await?)
    }

    async fn tournament_of_match(&self, match_id: &str) -> Result<String, TournamentServiceError> {
        self.repository
            .find_tournament_by_match(match_id)
            .await?
            .ok_or_else(|| TournamentServiceError::MatchNotFound(match_id.to_string()))
    }

    async fn open_match_room(
        &self,
        tournament_id: &str,
        game: &TournamentMatch,
        game_id: &str,
    ) -> Result<(), TournamentServiceError> {
        self.rooms
            .open_room(
                game_id,
                RoomKind::Tournament {
                    tournament_id: tournament_id.to_string(),
                    match_id: game.match_id.clone(),
                },
                Some([game.player1.clone(), game.player2.clone()]),
            )
            .await?;
        info!(
            "Opened game {} for tournament match {} ({} vs {})",
            game_id, game.match_id, game.player1, game.player2
        );

        let notification = ServerMessage::TournamentMatchReady {
            tournament_id: tournament_id.to_string(),
            match_id: game.match_id.clone(),
            game_id: game_id.to_string(),
        };
        for player in [&game.player1, &game.player2] {
            if let Err(e) = self
                .websocket_service
                .send_notification(player, notification.clone())
                .await
            {
                warn!("Failed to notify {} about match {}: {}", player, game.match_id, e);
            }
        }
        Ok(())
    }

    /// Read, edit, conditionally write; retried until the write lands or the
    /// edit reports nothing to do.
    async fn modify<T, F>(
        &self,
        tournament_id: &str,
        mut edit: F,
    ) -> Result<(T, Tournament), TournamentServiceError>
    where
        F: FnMut(&mut Tournament) -> Result<Mutation<T>, BracketError>,
    {
        loop {
            let current = self.get_tournament(tournament_id).await?;
            let expected_version = current.version;
            let mut next = current.clone();

            match edit(&mut next)? {
                Mutation::Unchanged(value) => return Ok((value, current)),
                Mutation::Changed(value) => {
                    next.version = expected_version + 1;
                    if self
                        .repository
                        .update_tournament(&next, expected_version)
                        .await?
                    {
                        return Ok((value, next));
                    }
                    debug!(
                        "Tournament {} changed concurrently, retrying update",
                        tournament_id
                    );
                    tokio::task::yield_now().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tournament::{MatchState, TournamentStatus};
    use crate::repositories::room_repository::InMemoryGameRoomRepository;
    use crate::repositories::tournament_repository::InMemoryTournamentRepository;
    use crate::repositories::websocket_repository::{
        ConnectionHandle, InMemoryWebSocketRepository,
    };
    use tokio::sync::mpsc;

    struct Fixture {
        service: TournamentService,
        repository: Arc<InMemoryTournamentRepository>,
        rooms: Arc<InMemoryGameRoomRepository>,
        websocket_service: Arc<WebSocketService>,
    }

    fn fixture() -> Fixture {
        let repository = Arc::new(InMemoryTournamentRepository::new());
        let rooms = Arc::new(InMemoryGameRoomRepository::new());
        let websocket_service = Arc::new(WebSocketService::new(Arc::new(
            InMemoryWebSocketRepository::new(),
        )));
        Fixture {
            service: TournamentService::new(
                repository.clone(),
                rooms.clone(),
                websocket_service.clone(),
            ),
            repository,
            rooms,
            websocket_service,
        }
    }

    /// Replaces the shuffled first round with a known pairing.
    async fn seed_round_one(
        repository: &InMemoryTournamentRepository,
        tournament_id: &str,
        pairs: &[(&str, &str)],
    ) -> Tournament {
        let mut tournament = repository
            .get_tournament(tournament_id)
            .await
            .unwrap()
            .unwrap();
        for (game, (a, b)) in tournament.rounds[0].matches.iter_mut().zip(pairs) {
            game.player1 = a.to_string();
            game.player2 = b.to_string();
        }
        let expected = tournament.version;
        tournament.version += 1;
        assert!(repository
            .update_tournament(&tournament, expected)
            .await
            .unwrap());
        tournament
    }

    async fn filled(service: &TournamentService, players: &[&str]) -> Tournament {
        let tournament = service
            .create_tournament("Cup", players.len(), Utc::now())
            .await
            .unwrap();
        let mut latest = tournament;
        for player in players {
            latest = service
                .join_tournament(&latest.tournament_id, player)
                .await
                .unwrap();
        }
        latest
    }

    fn scores(winner: &str, loser: &str) -> Vec<PlayerScore> {
        vec![
            PlayerScore {
                user_id: winner.to_string(),
                score: 5,
            },
            PlayerScore {
                user_id: loser.to_string(),
                score: 1,
            },
        ]
    }

    #[tokio::test]
    async fn test_join_fills_and_generates_first_round() {
        let Fixture { service, .. } = fixture();

        let tournament = filled(&service, &["P1", "P2", "P3", "P4"]).await;

        assert_eq!(tournament.status, TournamentStatus::InProgress);
        assert_eq!(tournament.rounds.len(), 1);
        assert_eq!(tournament.rounds[0].matches.len(), 2);
        assert_eq!(
            service
                .get_upcoming_matches(&tournament.tournament_id)
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_join_full_or_unknown_tournament_fails() {
        let Fixture { service, .. } = fixture();
        let tournament = filled(&service, &["P1", "P2"]).await;

        let full = service
            .join_tournament(&tournament.tournament_id, "P3")
            .await;
        assert_eq!(
            full.unwrap_err(),
            TournamentServiceError::Bracket(BracketError::AlreadyStarted)
        );

        let unknown = service.join_tournament("nope", "P3").await;
        assert_eq!(
            unknown.unwrap_err(),
            TournamentServiceError::TournamentNotFound("nope".to_string())
        );

        let stored = service
            .get_tournament(&tournament.tournament_id)
            .await
            .unwrap();
        assert_eq!(stored.player_slots.len(), 2);
    }

    #[tokio::test]
    async fn test_four_player_bracket_champion() {
        let Fixture {
            service,
            repository,
            ..
        } = fixture();
        let tournament = filled(&service, &["P1", "P2", "P3", "P4"]).await;
        let id = tournament.tournament_id.clone();
        let tournament = seed_round_one(&repository, &id, &[("P1", "P2"), ("P3", "P4")]).await;
        let round_one = tournament.rounds[0].matches.clone();

        let first = service
            .report_match_result(&round_one[0].match_id, "P1", "P1", &scores("P1", "P2"), false)
            .await
            .unwrap();
        assert_eq!(first.advancement, Some(Advancement::Pending));
        assert_eq!(service.get_tournament(&id).await.unwrap().rounds.len(), 1);

        let second = service
            .report_match_result(&round_one[1].match_id, "P3", "P3", &scores("P3", "P4"), false)
            .await
            .unwrap();
        assert_eq!(second.advancement, Some(Advancement::NextRound(2)));

        let final_match = service.get_upcoming_matches(&id).await.unwrap();
        assert_eq!(final_match.len(), 1);
        assert_eq!(final_match[0].round_number, 2);
        assert_eq!(final_match[0].player1, "P1");
        assert_eq!(final_match[0].player2, "P3");

        let report = service
            .report_match_result(&final_match[0].match_id, "P1", "P1", &scores("P1", "P3"), false)
            .await
            .unwrap();

        assert_eq!(
            report.advancement,
            Some(Advancement::Completed {
                champion_id: "P1".to_string()
            })
        );
        let done = service.get_tournament(&id).await.unwrap();
        assert_eq!(done.status, TournamentStatus::Completed);
        assert_eq!(done.champion_id.as_deref(), Some("P1"));
        assert!(service.get_upcoming_matches(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_report_is_acknowledged_without_change() {
        let Fixture { service, .. } = fixture();
        let tournament = filled(&service, &["A", "B", "C", "D"]).await;
        let game = tournament.rounds[0].matches[0].clone();

        service
            .report_match_result(
                &game.match_id,
                &game.player1,
                &game.player1,
                &scores(&game.player1, &game.player2),
                false,
            )
            .await
            .unwrap();
        let before = service
            .get_tournament(&tournament.tournament_id)
            .await
            .unwrap();

        let duplicate = service
            .report_match_result(
                &game.match_id,
                &game.player2,
                &game.player2,
                &scores(&game.player2, &game.player1),
                false,
            )
            .await
            .unwrap();

        assert!(duplicate.duplicate);
        assert_eq!(
            service
                .get_tournament(&tournament.tournament_id)
                .await
                .unwrap(),
            before
        );
    }

    #[tokio::test]
    async fn test_list_tournaments_includes_every_stage() {
        let Fixture { service, .. } = fixture();
        let registering = service
            .create_tournament("Open", 4, Utc::now())
            .await
            .unwrap();
        let running = filled(&service, &["A", "B"]).await;

        let listed = service.list_tournaments().await.unwrap();

        assert_eq!(listed.len(), 2);
        let status_of = |id: &str| {
            listed
                .iter()
                .find(|t| t.tournament_id == id)
                .map(|t| t.status)
        };
        assert_eq!(
            status_of(&registering.tournament_id),
            Some(TournamentStatus::Registering)
        );
        assert_eq!(
            status_of(&running.tournament_id),
            Some(TournamentStatus::InProgress)
        );
    }

    #[tokio::test]
    async fn test_report_from_outside_the_match_is_refused() {
        let Fixture { service, .. } = fixture();
        let tournament = filled(&service, &["A", "B", "C", "D"]).await;
        let game = tournament.rounds[0].matches[0].clone();
        let outsider = tournament.rounds[0].matches[1].player1.clone();

        assert_eq!(
            service
                .report_match_result(
                    &game.match_id,
                    &outsider,
                    &game.player1,
                    &scores(&game.player1, &game.player2),
                    false,
                )
                .await
                .unwrap_err(),
            TournamentServiceError::Bracket(BracketError::NotAParticipant)
        );
        assert_eq!(
            service
                .report_match_result(
                    &game.match_id,
                    &game.player1,
                    &game.player1,
                    &scores(&game.player2, &game.player1),
                    false,
                )
                .await
                .unwrap_err(),
            TournamentServiceError::Bracket(BracketError::InvalidScores)
        );
        let stored = service
            .get_tournament(&tournament.tournament_id)
            .await
            .unwrap();
        assert!(!stored.find_match(&game.match_id).unwrap().is_completed());
    }

    #[tokio::test]
    async fn test_ready_opens_one_room_and_notifies_both() {
        let Fixture {
            service,
            rooms,
            websocket_service,
            ..
        } = fixture();
        let tournament = filled(&service, &["A", "B"]).await;
        let game = tournament.rounds[0].matches[0].clone();

        let mut receivers = Vec::new();
        for (index, player) in [&game.player1, &game.player2].into_iter().enumerate() {
            let (tx, rx) = mpsc::unbounded_channel();
            websocket_service
                .store_connection(
                    player,
                    ConnectionHandle {
                        connection_id: format!("lobby-{}", index),
                        game_id: None,
                        sender: tx,
                    },
                )
                .await
                .unwrap();
            receivers.push(rx);
        }

        let first = service.mark_ready(&game.match_id, &game.player1).await.unwrap();
        assert_eq!(first.state, MatchState::ReadyWait);
        assert!(!first.session_created);
        assert_eq!(rooms.room_count().await, 0);

        let second = service.mark_ready(&game.match_id, &game.player2).await.unwrap();
        assert!(second.session_created);
        let game_id = second.game_id.clone().unwrap();
        assert!(rooms.get_room(&game_id).await.is_some());

        let again = service.mark_ready(&game.match_id, &game.player1).await.unwrap();
        assert!(!again.session_created);
        assert_eq!(again.game_id, Some(game_id.clone()));
        assert_eq!(rooms.room_count().await, 1);

        for rx in receivers.iter_mut() {
            assert_eq!(
                rx.try_recv().ok(),
                Some(ServerMessage::TournamentMatchReady {
                    tournament_id: tournament.tournament_id.clone(),
                    match_id: game.match_id.clone(),
                    game_id: game_id.clone(),
                })
            );
            assert!(rx.try_recv().is_err());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reports_advance_once() {
        let Fixture { service, .. } = fixture();
        let players: Vec<String> = (1..=8).map(|i| format!("P{}", i)).collect();
        let names: Vec<&str> = players.iter().map(String::as_str).collect();
        let tournament = filled(&service, &names).await;

        let handles: Vec<_> = tournament.rounds[0]
            .matches
            .iter()
            .cloned()
            .map(|m| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .report_match_result(
                            &m.match_id,
                            &m.player1,
                            &m.player1,
                            &scores(&m.player1, &m.player2),
                            false,
                        )
                        .await
                })
            })
            .collect();

        let mut next_rounds = 0;
        for handle in handles {
            let report = handle.await.unwrap().unwrap();
            if report.advancement == Some(Advancement::NextRound(2)) {
                next_rounds += 1;
            }
        }

        let stored = service
            .get_tournament(&tournament.tournament_id)
            .await
            .unwrap();
        assert_eq!(next_rounds, 1);
        assert_eq!(stored.rounds.len(), 2);
        assert_eq!(stored.rounds[1].matches.len(), 2);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_size() {
        let Fixture { service, .. } = fixture();

        let result = service.create_tournament("Cup", 3, Utc::now()).await;

        assert_eq!(
            result.unwrap_err(),
            TournamentServiceError::Bracket(BracketError::InvalidSize(3))
        );
    }
}
