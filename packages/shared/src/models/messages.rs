use serde::{Deserialize, Serialize};

use crate::models::game_session::{GameState, Side};

/// Frames a client may send on a game connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    PaddleMove {
        y: f64,
    },
    BallUpdate {
        ball_x: f64,
        ball_y: f64,
        #[serde(rename = "ballVX")]
        ball_vx: f64,
        #[serde(rename = "ballVY")]
        ball_vy: f64,
        #[serde(default)]
        game_started: bool,
    },
    ScoreUpdate {
        left_score: u32,
        right_score: u32,
        #[serde(default)]
        winner: Option<Side>,
    },
    GiveUp,
    PauseGame,
    ResumeGame,
    RequestRematch,
}

impl ClientMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::PaddleMove { .. } => "paddleMove",
            ClientMessage::BallUpdate { .. } => "ballUpdate",
            ClientMessage::ScoreUpdate { .. } => "scoreUpdate",
            ClientMessage::GiveUp => "giveUp",
            ClientMessage::PauseGame => "pauseGame",
            ClientMessage::ResumeGame => "resumeGame",
            ClientMessage::RequestRematch => "requestRematch",
        }
    }
}

/// Frames the server pushes to game and lobby connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    Ready {
        side: Side,
        left_name: String,
        right_name: String,
        left_user_id: String,
        right_user_id: String,
        state: GameState,
    },
    PaddleUpdate {
        side: Side,
        y: f64,
    },
    BallUpdate {
        ball_x: f64,
        ball_y: f64,
        #[serde(rename = "ballVX")]
        ball_vx: f64,
        #[serde(rename = "ballVY")]
        ball_vy: f64,
        game_started: bool,
    },
    ScoreUpdate {
        left_score: u32,
        right_score: u32,
        winner: Option<Side>,
    },
    OpponentLeft {
        winner: Side,
    },
    GamePaused,
    GameResumed,
    RematchRequested {
        side: Side,
    },
    Error {
        message: String,
    },
    MatchFound {
        game_id: String,
        opponent_id: String,
    },
    TournamentMatchReady {
        tournament_id: String,
        match_id: String,
        game_id: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
