use serde::{Deserialize, Serialize};

use crate::models::matchmaking::{JoinOutcome, MatchmakingStatus, Pairing};

/// Wire shape of matchmaking answers: `{"waiting":true}`,
/// `{"matched":true,"gameId":..,"opponentId":..}` or `{"none":true}`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchmakingResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiting: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub none: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent_id: Option<String>,
}

impl MatchmakingResponse {
    fn waiting() -> Self {
        MatchmakingResponse {
            waiting: Some(true),
            ..Default::default()
        }
    }

    fn matched(pairing: Pairing) -> Self {
        MatchmakingResponse {
            matched: Some(true),
            game_id: Some(pairing.game_id),
            opponent_id: Some(pairing.opponent_id),
            ..Default::default()
        }
    }
}

impl From<JoinOutcome> for MatchmakingResponse {
    fn from(outcome: JoinOutcome) -> Self {
        match outcome {
            JoinOutcome::Waiting => MatchmakingResponse::waiting(),
            JoinOutcome::Matched(pairing) => MatchmakingResponse::matched(pairing),
        }
    }
}

impl From<MatchmakingStatus> for MatchmakingResponse {
    fn from(status: MatchmakingStatus) -> Self {
        match status {
            MatchmakingStatus::Waiting => MatchmakingResponse::waiting(),
            MatchmakingStatus::Matched(pairing) => MatchmakingResponse::matched(pairing),
            MatchmakingStatus::NotQueued => MatchmakingResponse {
                none: Some(true),
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_response_shapes() {
        let waiting = serde_json::to_value(MatchmakingResponse::from(JoinOutcome::Waiting)).unwrap();
        assert_eq!(waiting, json!({"waiting": true}));

        let matched = serde_json::to_value(MatchmakingResponse::from(MatchmakingStatus::Matched(
            Pairing {
                game_id: "g1".to_string(),
                opponent_id: "u1".to_string(),
                matched_at: Utc::now(),
            },
        )))
        .unwrap();
        assert_eq!(
            matched,
            json!({"matched": true, "gameId": "g1", "opponentId": "u1"})
        );

        let none = serde_json::to_value(MatchmakingResponse::from(MatchmakingStatus::NotQueued)).unwrap();
        assert_eq!(none, json!({"none": true}));
    }
}
