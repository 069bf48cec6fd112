use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Points needed to win a match.
pub const WIN_SCORE: u32 = 5;

pub const FIELD_WIDTH: f64 = 800.0;
pub const FIELD_HEIGHT: f64 = 400.0;
/// How far outside the field the ball may travel before a point is scored.
pub const BALL_MARGIN: f64 = 50.0;
/// Upper bound on either ball velocity component, in field units per tick.
pub const MAX_BALL_SPEED: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }

    pub fn from_index(index: usize) -> Side {
        if index == 0 {
            Side::Left
        } else {
            Side::Right
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameStateError {
    NonFinite(&'static str),
    OutOfBounds { field: &'static str, value: f64 },
    ScoreDecreased,
    ScoreAboveThreshold,
    BothSidesWon,
}

impl fmt::Display for GameStateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GameStateError::NonFinite(field) => write!(f, "{} must be a finite number", field),
            GameStateError::OutOfBounds { field, value } => {
                write!(f, "{} is out of bounds: {}", field, value)
            }
            GameStateError::ScoreDecreased => write!(f, "Scores cannot decrease"),
            GameStateError::ScoreAboveThreshold => {
                write!(f, "Scores cannot exceed {}", WIN_SCORE)
            }
            GameStateError::BothSidesWon => write!(f, "Only one side can reach the win score"),
        }
    }
}

impl std::error::Error for GameStateError {}

/// Authoritative state of one match. Ball and score fields are written by the
/// host only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub left_paddle_y: f64,
    pub right_paddle_y: f64,
    pub ball_x: f64,
    pub ball_y: f64,
    pub ball_velocity_x: f64,
    pub ball_velocity_y: f64,
    pub left_score: u32,
    pub right_score: u32,
    pub started: bool,
    pub winner: Option<Side>,
}

impl Default for GameState {
    fn default() -> Self {
        GameState {
            left_paddle_y: FIELD_HEIGHT / 2.0,
            right_paddle_y: FIELD_HEIGHT / 2.0,
            ball_x: FIELD_WIDTH / 2.0,
            ball_y: FIELD_HEIGHT / 2.0,
            ball_velocity_x: 0.0,
            ball_velocity_y: 0.0,
            left_score: 0,
            right_score: 0,
            started: false,
            winner: None,
        }
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), GameStateError> {
    if !value.is_finite() {
        return Err(GameStateError::NonFinite(field));
    }
    if value < min || value > max {
        return Err(GameStateError::OutOfBounds { field, value });
    }
    Ok(())
}

impl GameState {

    pub fn apply_paddle(&mut self, side: Side, y: f64) -> Result<(), GameStateError> {
        check_range("y", y, 0.0, FIELD_HEIGHT)?;
        match side {
            Side::Left => self.left_paddle_y = y,
            Side::Right => self.right_paddle_y = y,
        }
        Ok(())
    }

    pub fn apply_ball(
        &mut self,
        x: f64,
        y: f64,
        velocity_x: f64,
        velocity_y: f64,
        started: bool,
    ) -> Result<(), GameStateError> {
        check_range("ballX", x, -BALL_MARGIN, FIELD_WIDTH + BALL_MARGIN)?;
        check_range("ballY", y, -BALL_MARGIN, FIELD_HEIGHT + BALL_MARGIN)?;
        check_range("ballVX", velocity_x, -MAX_BALL_SPEED, MAX_BALL_SPEED)?;
        check_range("ballVY", velocity_y, -MAX_BALL_SPEED, MAX_BALL_SPEED)?;

        self.ball_x = x;
        self.ball_y = y;
        self.ball_velocity_x = velocity_x;
        self.ball_velocity_y = velocity_y;
        self.started = started;
        Ok(())
    }

    /// Overwrites both scores and derives the winner from them. The winner a
    /// client claims is never trusted.
    pub fn apply_score(&mut self, left: u32, right: u32) -> Result<Option<Side>, GameStateError> {
        if left < self.left_score || right < self.right_score {
            return Err(GameStateError::ScoreDecreased);
        }
        if left > WIN_SCORE || right > WIN_SCORE {
            return Err(GameStateError::ScoreAboveThreshold);
        }
        if left == WIN_SCORE && right == WIN_SCORE {
            return Err(GameStateError::BothSidesWon);
        }

        self.left_score = left;
        self.right_score = right;
        if left == WIN_SCORE {
            self.winner = Some(Side::Left);
        } else if right == WIN_SCORE {
            self.winner = Some(Side::Right);
        }
        Ok(self.winner)
    }

    pub fn declare_winner(&mut self, side: Side) {
        if self.winner.is_none() {
            self.winner = Some(side);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FinishReason {
    Score,
    Forfeit,
}

/// A finished match as handed to the stats/history collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub game_id: String,
    pub tournament_id: Option<String>,
    pub match_id: Option<String>,
    pub winner_id: String,
    pub loser_id: String,
    pub left_user_id: String,
    pub right_user_id: String,
    pub left_score: u32,
    pub right_score: u32,
    pub reason: FinishReason,
    pub finished_at: DateTime<Utc>,
}

impl MatchRecord {
    pub fn score_for(&self, user_id: &str) -> u32 {
        if user_id == self.left_user_id {
            self.left_score
        } else if user_id == self.right_user_id {
            self.right_score
        } else {
            0
        }
    }
}
