pub mod responses;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A player currently waiting in the matchmaking queue.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WaitingEntry {
    pub player_id: String,
    pub joined_at: DateTime<Utc>,
}

impl WaitingEntry {
    pub fn new(player_id: &str) -> Self {
        WaitingEntry {
            player_id: player_id.to_string(),
            joined_at: Utc::now(),
        }
    }
}

/// One side's view of a committed pairing.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Pairing {
    pub game_id: String,
    pub opponent_id: String,
    pub matched_at: DateTime<Utc>,
}

/// A conditional claim on a waiting entry. Only the holder of the token can
/// turn the claim into a pairing.
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub player_id: String,
    pub token: Uuid,
}

impl Reservation {
    pub fn new(player_id: &str) -> Self {
        Reservation {
            player_id: player_id.to_string(),
            token: Uuid::new_v4(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    Waiting,
    Matched(Pairing),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchmakingStatus {
    Waiting,
    Matched(Pairing),
    NotQueued,
}

/// Result of trying to enqueue a player.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueInsert {
    Inserted,
    /// Someone became pairable since the last scan; the caller should pair
    /// instead of waiting.
    OpponentAvailable,
    AlreadyPaired(Pairing),
}

/// Result of committing a reservation into a pairing.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    Committed,
    OpponentGone,
    AlreadyPaired(Pairing),
}
