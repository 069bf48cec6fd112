use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PlayerScore;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTournamentRequest {
    pub name: String,
    pub size: usize,
    pub start_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResultRequest {
    pub winner_id: String,
    #[serde(default)]
    pub scores: Vec<PlayerScore>,
    /// The loser conceded; scores then need not favour the winner.
    #[serde(default)]
    pub forfeit: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_uses_camel_case_dates() {
        let request: CreateTournamentRequest = serde_json::from_str(
            r#"{"name":"Spring Cup","size":8,"startDate":"2026-03-01T18:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(request.name, "Spring Cup");
        assert_eq!(request.size, 8);
        assert_eq!(request.start_date.to_rfc3339(), "2026-03-01T18:00:00+00:00");
    }

    #[test]
    fn test_report_request_scores_are_optional() {
        let request: ReportResultRequest =
            serde_json::from_str(r#"{"winnerId":"alice"}"#).unwrap();

        assert_eq!(request.winner_id, "alice");
        assert!(request.scores.is_empty());
        assert!(!request.forfeit);
    }
}
