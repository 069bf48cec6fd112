use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MatchState, ReadyOutcome, Tournament, TournamentStatus};

/// Registration-level view returned by create, join and list.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentSummary {
    pub tournament_id: String,
    pub name: String,
    pub size: usize,
    pub start_date: DateTime<Utc>,
    pub status: TournamentStatus,
    pub players: Vec<String>,
}

impl From<&Tournament> for TournamentSummary {
    fn from(tournament: &Tournament) -> Self {
        TournamentSummary {
            tournament_id: tournament.tournament_id.clone(),
            name: tournament.name.clone(),
            size: tournament.size,
            start_date: tournament.start_date,
            status: tournament.status,
            players: tournament.player_slots.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    pub state: MatchState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
}

impl From<ReadyOutcome> for ReadyResponse {
    fn from(outcome: ReadyOutcome) -> Self {
        ReadyResponse {
            state: outcome.state,
            game_id: outcome.game_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResultResponse {
    pub accepted: bool,
    pub duplicate: bool,
}
