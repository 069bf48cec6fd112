use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::models::matchmaking::{CommitOutcome, Pairing, QueueInsert, Reservation, WaitingEntry};
use crate::repositories::errors::queue_repository_errors::QueueRepositoryError;

#[cfg(test)]
use mockall::automock;

/// Storage for the waiting list and committed pairings.
///
/// Pairing is a two-step protocol: `check_and_reserve_opponent` places a
/// conditional claim on a waiting entry, and `create_game_session` either
/// commits both sides at once or reports why it could not.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QueueRepository: Send + Sync {
    /// Drops the player's waiting entry and both sides of any pairing they
    /// are part of. Returns the dissolved pairing, seen from `player_id`.
    async fn remove_player(&self, player_id: &str)
        -> Result<Option<Pairing>, QueueRepositoryError>;

    /// Unreserved waiting entries other than `excluded_player_id`, oldest first.
    async fn find_potential_opponents(
        &self,
        excluded_player_id: &str,
    ) -> Result<Vec<WaitingEntry>, QueueRepositoryError>;

    async fn check_and_reserve_opponent(
        &self,
        opponent: &WaitingEntry,
    ) -> Result<Option<Reservation>, QueueRepositoryError>;

    async fn release_reservation(&self, reservation: &Reservation)
        -> Result<(), QueueRepositoryError>;

    async fn create_game_session(
        &self,
        player_id: &str,
        reservation: &Reservation,
        game_id: &str,
    ) -> Result<CommitOutcome, QueueRepositoryError>;

    async fn join_queue(&self, entry: &WaitingEntry) -> Result<QueueInsert, QueueRepositoryError>;

    async fn get_pairing(&self, player_id: &str) -> Result<Option<Pairing>, QueueRepositoryError>;

    async fn is_waiting(&self, player_id: &str) -> Result<bool, QueueRepositoryError>;
}

#[derive(Default)]
struct QueueTables {
    waiting: Vec<WaitingEntry>,
    reservations: HashMap<String, Reservation>,
    pairings: HashMap<String, Pairing>,
}

impl QueueTables {
    fn is_waiting(&self, player_id: &str) -> bool {
        self.waiting.iter().any(|e| e.player_id == player_id)
    }

    fn remove_waiting(&mut self, player_id: &str) {
        self.waiting.retain(|e| e.player_id != player_id);
        self.reservations.remove(player_id);
    }

    fn has_unreserved_opponent(&self, player_id: &str) -> bool {
        self.waiting
            .iter()
            .any(|e| e.player_id != player_id && !self.reservations.contains_key(&e.player_id))
    }
}

/// Single-process queue. Every operation runs under one lock, so each call is
/// atomic with respect to the others.
#[derive(Default)]
pub struct InMemoryQueueRepository {
    tables: Mutex<QueueTables>,
}

impl InMemoryQueueRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn waiting_count(&self) -> usize {
        self.tables.lock().await.waiting.len()
    }

    #[cfg(test)]
    pub(crate) async fn insert_waiting(&self, entries: &[WaitingEntry]) {
        let mut tables = self.tables.lock().await;
        for entry in entries {
            tables.remove_waiting(&entry.player_id);
            tables.waiting.push(entry.clone());
        }
    }
}

fn validate_player_id(player_id: &str) -> Result<(), QueueRepositoryError> {
    if player_id.trim().is_empty() {
        return Err(QueueRepositoryError::InvalidPlayer(player_id.to_string()));
    }
    Ok(())
}

#[async_trait]
impl QueueRepository for InMemoryQueueRepository {
    async fn remove_player(
        &self,
        player_id: &str,
    ) -> Result<Option<Pairing>, QueueRepositoryError> {
        let mut tables = self.tables.lock().await;
        tables.remove_waiting(player_id);
        let pairing = tables.pairings.remove(player_id);
        if let Some(pairing) = &pairing {
            tables.pairings.remove(&pairing.opponent_id);
        }
        Ok(pairing)
    }

    async fn find_potential_opponents(
        &self,
        excluded_player_id: &str,
    ) -> Result<Vec<WaitingEntry>, QueueRepositoryError> {
        let tables = self.tables.lock().await;
        let mut opponents: Vec<WaitingEntry> = tables
            .waiting
            .iter()
            .filter(|e| {
                e.player_id != excluded_player_id && !tables.reservations.contains_key(&e.player_id)
            })
            .cloned()
            .collect();
        opponents.sort_by_key(|e| e.joined_at);
        Ok(opponents)
    }

    async fn check_and_reserve_opponent(
        &self,
        opponent: &WaitingEntry,
    ) -> Result<Option<Reservation>, QueueRepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables.is_waiting(&opponent.player_id)
            || tables.reservations.contains_key(&opponent.player_id)
        {
            return Ok(None);
        }

        let reservation = Reservation::new(&opponent.player_id);
        tables
            .reservations
            .insert(opponent.player_id.clone(), reservation.clone());
        Ok(Some(reservation))
    }

    async fn release_reservation(
        &self,
        reservation: &Reservation,
    ) -> Result<(), QueueRepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables
            .reservations
            .get(&reservation.player_id)
            .is_some_and(|held| held.token == reservation.token)
        {
            tables.reservations.remove(&reservation.player_id);
        }
        Ok(())
    }

    async fn create_game_session(
        &self,
        player_id: &str,
        reservation: &Reservation,
        game_id: &str,
    ) -> Result<CommitOutcome, QueueRepositoryError> {
        validate_player_id(player_id)?;
        let mut tables = self.tables.lock().await;

        let reservation_held = tables
            .reservations
            .get(&reservation.player_id)
            .is_some_and(|held| held.token == reservation.token);
        if !reservation_held || !tables.is_waiting(&reservation.player_id) {
            return Ok(CommitOutcome::OpponentGone);
        }

        if let Some(existing) = tables.pairings.get(player_id).cloned() {
            tables.reservations.remove(&reservation.player_id);
            return Ok(CommitOutcome::AlreadyPaired(existing));
        }

        let opponent_id = reservation.player_id.clone();
        tables.remove_waiting(&opponent_id);
        tables.remove_waiting(player_id);

        let matched_at = Utc::now();
        tables.pairings.insert(
            player_id.to_string(),
            Pairing {
                game_id: game_id.to_string(),
                opponent_id: opponent_id.clone(),
                matched_at,
            },
        );
        tables.pairings.insert(
            opponent_id,
            Pairing {
                game_id: game_id.to_string(),
                opponent_id: player_id.to_string(),
                matched_at,
            },
        );
        Ok(CommitOutcome::Committed)
    }

    async fn join_queue(&self, entry: &WaitingEntry) -> Result<QueueInsert, QueueRepositoryError> {
        validate_player_id(&entry.player_id)?;
        let mut tables = self.tables.lock().await;

        if let Some(existing) = tables.pairings.get(&entry.player_id) {
            return Ok(QueueInsert::AlreadyPaired(existing.clone()));
        }
        if tables.has_unreserved_opponent(&entry.player_id) {
            return Ok(QueueInsert::OpponentAvailable);
        }

        tables.remove_waiting(&entry.player_id);
        tables.waiting.push(entry.clone());
        Ok(QueueInsert::Inserted)
    }

    async fn get_pairing(&self, player_id: &str) -> Result<Option<Pairing>, QueueRepositoryError> {
        Ok(self.tables.lock().await.pairings.get(player_id).cloned())
    }

    async fn is_waiting(&self, player_id: &str) -> Result<bool, QueueRepositoryError> {
        Ok(self.tables.lock().await.is_waiting(player_id))
    }
}
