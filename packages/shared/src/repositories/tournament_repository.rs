use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::models::tournament::Tournament;
use crate::repositories::errors::tournament_repository_errors::TournamentRepositoryError;

#[async_trait]
pub trait TournamentRepository: Send + Sync {
    async fn create_tournament(&self, tournament: &Tournament)
        -> Result<(), TournamentRepositoryError>;

    async fn get_tournament(
        &self,
        tournament_id: &str,
    ) -> Result<Option<Tournament>, TournamentRepositoryError>;

    async fn find_tournament_by_match(
        &self,
        match_id: &str,
    ) -> Result<Option<String>, TournamentRepositoryError>;

    /// Conditional write: stores `tournament` only if the stored version still
    /// equals `expected_version`. Returns whether the write happened.
    async fn update_tournament(
        &self,
        tournament: &Tournament,
        expected_version: u64,
    ) -> Result<bool, TournamentRepositoryError>;

    async fn list_tournaments(&self) -> Result<Vec<Tournament>, TournamentRepositoryError>;
}

#[derive(Default)]
struct TournamentTables {
    tournaments: HashMap<String, Tournament>,
    match_index: HashMap<String, String>,
}

impl TournamentTables {
    fn index_matches(&mut self, tournament: &Tournament) {
        for match_id in tournament.match_ids() {
            self.match_index
                .insert(match_id.to_string(), tournament.tournament_id.clone());
        }
    }
}

#[derive(Default)]
pub struct InMemoryTournamentRepository {
    tables: RwLock<TournamentTables>,
}

impl InMemoryTournamentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TournamentRepository for InMemoryTournamentRepository {
    async fn create_tournament(
        &self,
        tournament: &Tournament,
    ) -> Result<(), TournamentRepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.tournaments.contains_key(&tournament.tournament_id) {
            return Err(TournamentRepositoryError::AlreadyExists(
                tournament.tournament_id.clone(),
            ));
        }

        tables.index_matches(tournament);
        tables
            .tournaments
            .insert(tournament.tournament_id.clone(), tournament.clone());
        Ok(())
    }

    async fn get_tournament(
        &self,
        tournament_id: &str,
    ) -> Result<Option<Tournament>, TournamentRepositoryError> {
        Ok(self.tables.read().await.tournaments.get(tournament_id).cloned())
    }

    async fn find_tournament_by_match(
        &self,
        match_id: &str,
    ) -> Result<Option<String>, TournamentRepositoryError> {
        Ok(self.tables.read().await.match_index.get(match_id).cloned())
    }

    async fn update_tournament(
        &self,
        tournament: &Tournament,
        expected_version: u64,
    ) -> Result<bool, TournamentRepositoryError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .tournaments
            .get(&tournament.tournament_id)
            .ok_or_else(|| TournamentRepositoryError::NotFound(tournament.tournament_id.clone()))?;
        if stored.version != expected_version {
            return Ok(false);
        }

        tables.index_matches(tournament);
        tables
            .tournaments
            .insert(tournament.tournament_id.clone(), tournament.clone());
        Ok(true)
    }

    async fn list_tournaments(&self) -> Result<Vec<Tournament>, TournamentRepositoryError> {
        let tables = self.tables.read().await;
        let mut tournaments: Vec<Tournament> = tables.tournaments.values().cloned().collect();
        tournaments.sort_by_key(|t| t.created_at);
        Ok(tournaments)
    }
}
