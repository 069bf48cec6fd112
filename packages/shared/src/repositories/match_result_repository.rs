use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::models::game_session::MatchRecord;
use crate::repositories::errors::match_result_repository_errors::MatchResultRepositoryError;

/// Boundary to the stats and match history store.
#[async_trait]
pub trait MatchResultRepository: Send + Sync {
    async fn record_result(&self, record: &MatchRecord) -> Result<(), MatchResultRepositoryError>;

    async fn list_results(&self) -> Result<Vec<MatchRecord>, MatchResultRepositoryError>;
}

#[derive(Default)]
pub struct InMemoryMatchResultRepository {
    records: Mutex<Vec<MatchRecord>>,
}

impl InMemoryMatchResultRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MatchResultRepository for InMemoryMatchResultRepository {
    async fn record_result(&self, record: &MatchRecord) -> Result<(), MatchResultRepositoryError> {
        debug!(
            "Recording result of game {}: {} beat {}",
            record.game_id, record.winner_id, record.loser_id
        );
        self.records.lock().await.push(record.clone());
        Ok(())
    }

    async fn list_results(&self) -> Result<Vec<MatchRecord>, MatchResultRepositoryError> {
        Ok(self.records.lock().await.clone())
    }
}
