pub mod requests;
pub mod responses;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const MIN_TOURNAMENT_SIZE: usize = 2;
pub const MAX_TOURNAMENT_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TournamentStatus {
    Registering,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchState {
    Upcoming,
    ReadyWait,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerScore {
    pub user_id: String,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentMatch {
    pub match_id: String,
    pub round_number: u32,
    pub player1: String,
    pub player2: String,
    pub state: MatchState,
    pub ready_players: Vec<String>,
    pub player1_score: Option<u32>,
    pub player2_score: Option<u32>,
    pub winner_id: Option<String>,
    pub game_id: Option<String>,
}

impl TournamentMatch {
    fn new(round_number: u32, player1: String, player2: String) -> Self {
        TournamentMatch {
            match_id: Uuid::new_v4().to_string(),
            round_number,
            player1,
            player2,
            state: MatchState::Upcoming,
            ready_players: Vec::new(),
            player1_score: None,
            player2_score: None,
            winner_id: None,
            game_id: None,
        }
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.player1 == user_id || self.player2 == user_id
    }

    pub fn is_completed(&self) -> bool {
        self.state == MatchState::Completed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub round_number: u32,
    pub matches: Vec<TournamentMatch>,
}

impl Round {
    pub fn is_complete(&self) -> bool {
        self.matches.iter().all(TournamentMatch::is_completed)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BracketError {
    InvalidName,
    InvalidSize(usize),
    AlreadyStarted,
    Full,
    AlreadyJoined,
    NotFull,
    InvalidRound(u32),
    RoundIncomplete(u32),
    MatchNotFound(String),
    NotAParticipant,
    MatchCompleted,
    InvalidWinner,
    InvalidScores,
}

impl fmt::Display for BracketError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BracketError::InvalidName => write!(f, "Tournament name cannot be empty"),
            BracketError::InvalidSize(size) => write!(
                f,
                "Tournament size must be a power of two between {} and {}, got {}",
                MIN_TOURNAMENT_SIZE, MAX_TOURNAMENT_SIZE, size
            ),
            BracketError::AlreadyStarted => write!(f, "Tournament has already started"),
            BracketError::Full => write!(f, "Tournament is full"),
            BracketError::AlreadyJoined => write!(f, "Player already joined this tournament"),
            BracketError::NotFull => write!(f, "Tournament is not full yet"),
            BracketError::InvalidRound(round) => write!(f, "Round {} does not exist", round),
            BracketError::RoundIncomplete(round) => {
                write!(f, "Round {} still has unfinished matches", round)
            }
            BracketError::MatchNotFound(id) => write!(f, "Match {} not found", id),
            BracketError::NotAParticipant => write!(f, "Player is not part of this match"),
            BracketError::MatchCompleted => write!(f, "Match is already completed"),
            BracketError::InvalidWinner => write!(f, "Winner must be one of the match players"),
            BracketError::InvalidScores => write!(
                f,
                "Scores must only reference the match players and favour the winner"
            ),
        }
    }
}

impl std::error::Error for BracketError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundGeneration {
    Generated(u32),
    AlreadyGenerated(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyOutcome {
    pub state: MatchState,
    pub game_id: Option<String>,
    /// True only for the call that moved the match into play.
    pub session_created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultOutcome {
    Recorded { round_number: u32 },
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advancement {
    Pending,
    NextRound(u32),
    Completed { champion_id: String },
    AlreadyAdvanced,
}

/// A single-elimination bracket. All mutation goes through the methods below;
/// persistence compares `version` to reject concurrent writers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub tournament_id: String,
    pub name: String,
    pub size: usize,
    pub start_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub status: TournamentStatus,
    pub player_slots: Vec<String>,
    pub rounds: Vec<Round>,
    pub champion_id: Option<String>,
    pub version: u64,
}

impl Tournament {
    pub fn new(name: &str, size: usize, start_date: DateTime<Utc>) -> Result<Self, BracketError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BracketError::InvalidName);
        }
        if !size.is_power_of_two() || !(MIN_TOURNAMENT_SIZE..=MAX_TOURNAMENT_SIZE).contains(&size)
        {
            return Err(BracketError::InvalidSize(size));
        }

        Ok(Tournament {
            tournament_id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            size,
            start_date,
            created_at: Utc::now(),
            status: TournamentStatus::Registering,
            player_slots: Vec::with_capacity(size),
            rounds: Vec::new(),
            champion_id: None,
            version: 0,
        })
    }

    pub fn round_count(&self) -> u32 {
        self.size.trailing_zeros()
    }

    pub fn is_full(&self) -> bool {
        self.player_slots.len() == self.size
    }

    pub fn round(&self, round_number: u32) -> Option<&Round> {
        self.rounds.iter().find(|r| r.round_number == round_number)
    }

    pub fn find_match(&self, match_id: &str) -> Option<&TournamentMatch> {
        self.rounds
            .iter()
            .flat_map(|round| round.matches.iter())
            .find(|m| m.match_id == match_id)
    }

    fn find_match_mut(&mut self, match_id: &str) -> Result<&mut TournamentMatch, BracketError> {
        self.rounds
            .iter_mut()
            .flat_map(|round| round.matches.iter_mut())
            .find(|m| m.match_id == match_id)
            .ok_or_else(|| BracketError::MatchNotFound(match_id.to_string()))
    }

    pub fn match_ids(&self) -> impl Iterator<Item = &str> {
        self.rounds
            .iter()
            .flat_map(|round| round.matches.iter())
            .map(|m| m.match_id.as_str())
    }

    /// Registers a player. Returns whether the bracket is now full.
    pub fn add_player(&mut self, user_id: &str) -> Result<bool, BracketError> {
        if self.status != TournamentStatus::Registering {
            return Err(BracketError::AlreadyStarted);
        }
        if self.player_slots.iter().any(|p| p == user_id) {
            return Err(BracketError::AlreadyJoined);
        }
        if self.is_full() {
            return Err(BracketError::Full);
        }

        self.player_slots.push(user_id.to_string());
        Ok(self.is_full())
    }

    /// Builds round `round_number` exactly once. Round one shuffles the
    /// registered players; later rounds pair the previous round's winners in
    /// match order.
    pub fn generate_round<R: Rng + ?Sized>(
        &mut self,
        round_number: u32,
        rng: &mut R,
    ) -> Result<RoundGeneration, BracketError> {
        if round_number == 0 || round_number > self.round_count() {
            return Err(BracketError::InvalidRound(round_number));
        }
        if self.round(round_number).is_some() {
            return Ok(RoundGeneration::AlreadyGenerated(round_number));
        }

        let players: Vec<String> = if round_number == 1 {
            if !self.is_full() {
                return Err(BracketError::NotFull);
            }
            let mut players = self.player_slots.clone();
            players.shuffle(rng);
            players
        } else {
            let previous = self
                .round(round_number - 1)
                .ok_or(BracketError::RoundIncomplete(round_number - 1))?;
            if !previous.is_complete() {
                return Err(BracketError::RoundIncomplete(round_number - 1));
            }
            previous
                .matches
                .iter()
                .filter_map(|m| m.winner_id.clone())
                .collect()
        };

        let matches = players
            .chunks_exact(2)
            .map(|pair| TournamentMatch::new(round_number, pair[0].clone(), pair[1].clone()))
            .collect();

        self.rounds.push(Round {
            round_number,
            matches,
        });
        self.status = TournamentStatus::InProgress;
        Ok(RoundGeneration::Generated(round_number))
    }

    /// Records a readiness signal. When the second participant signals,
    /// `candidate_game_id` becomes the match's game id.
    pub fn mark_ready(
        &mut self,
        match_id: &str,
        user_id: &str,
        candidate_game_id: &str,
    ) -> Result<ReadyOutcome, BracketError> {
        let game = self.find_match_mut(match_id)?;
        if !game.involves(user_id) {
            return Err(BracketError::NotAParticipant);
        }
        if game.is_completed() {
            return Err(BracketError::MatchCompleted);
        }
        if game.game_id.is_some() {
            return Ok(ReadyOutcome {
                state: game.state,
                game_id: game.game_id.clone(),
                session_created: false,
            });
        }

        if !game.ready_players.iter().any(|p| p == user_id) {
            game.ready_players.push(user_id.to_string());
        }
        game.state = MatchState::ReadyWait;

        let both_ready = game.ready_players.iter().any(|p| *p == game.player1)
            && game.ready_players.iter().any(|p| *p == game.player2);
        if both_ready {
            game.game_id = Some(candidate_game_id.to_string());
        }

        Ok(ReadyOutcome {
            state: game.state,
            game_id: game.game_id.clone(),
            session_created: both_ready,
        })
    }

    /// Only the two players of a match may report it. Unless the match was
    /// forfeited, the winner must hold the strictly higher score; missing
    /// scores count as zero.
    pub fn record_result(
        &mut self,
        match_id: &str,
        reported_by: &str,
        winner_id: &str,
        scores: &[PlayerScore],
        forfeit: bool,
    ) -> Result<ResultOutcome, BracketError> {
        let game = self.find_match_mut(match_id)?;
        if !game.involves(reported_by) {
            return Err(BracketError::NotAParticipant);
        }
        if game.is_completed() {
            return Ok(ResultOutcome::Duplicate);
        }
        if !game.involves(winner_id) {
            return Err(BracketError::InvalidWinner);
        }
        if scores.iter().any(|s| !game.involves(&s.user_id)) {
            return Err(BracketError::InvalidScores);
        }

        let score_of = |player: &str| {
            scores
                .iter()
                .find(|s| s.user_id == player)
                .map_or(0, |s| s.score)
        };
        let loser_id = if game.player1 == winner_id {
            &game.player2
        } else {
            &game.player1
        };
        if !forfeit && score_of(winner_id) <= score_of(loser_id) {
            return Err(BracketError::InvalidScores);
        }

        game.player1_score = Some(score_of(&game.player1));
        game.player2_score = Some(score_of(&game.player2));
        game.winner_id = Some(winner_id.to_string());
        game.state = MatchState::Completed;

        Ok(ResultOutcome::Recorded {
            round_number: game.round_number,
        })
    }

    pub fn advance_if_round_complete<R: Rng + ?Sized>(
        &mut self,
        round_number: u32,
        rng: &mut R,
    ) -> Result<Advancement, BracketError> {
        let round = self
            .round(round_number)
            .ok_or(BracketError::InvalidRound(round_number))?;
        if !round.is_complete() {
            return Ok(Advancement::Pending);
        }

        if round_number == self.round_count() {
            if self.status == TournamentStatus::Completed {
                return Ok(Advancement::AlreadyAdvanced);
            }
            let champion_id = round
                .matches
                .first()
                .and_then(|m| m.winner_id.clone())
                .ok_or(BracketError::RoundIncomplete(round_number))?;
            self.champion_id = Some(champion_id.clone());
            self.status = TournamentStatus::Completed;
            return Ok(Advancement::Completed { champion_id });
        }

        match self.generate_round(round_number + 1, rng)? {
            RoundGeneration::Generated(next) => Ok(Advancement::NextRound(next)),
            RoundGeneration::AlreadyGenerated(_) => Ok(Advancement::AlreadyAdvanced),
        }
    }

    /// Matches of the current round that have not finished yet.
    pub fn upcoming_matches(&self) -> Vec<TournamentMatch> {
        if self.status == TournamentStatus::Completed {
            return Vec::new();
        }
        self.rounds
            .last()
            .map(|round| {
                round
                    .matches
                    .iter()
                    .filter(|m| !m.is_completed())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}
