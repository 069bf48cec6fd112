use chrono::Utc;
use std::fmt;
use tokio::sync::mpsc;
use tracing::debug;

use crate::models::auth::AuthenticatedIdentity;
use crate::models::game_session::{
    FinishReason, GameState, GameStateError, MatchRecord, Side,
};
use crate::models::messages::{ClientMessage, ServerMessage};

pub type ConnectionSender = mpsc::UnboundedSender<ServerMessage>;

/// Outbound half of one live socket. Messages are delivered in send order.
#[derive(Debug, Clone)]
pub struct RoomConnection {
    pub connection_id: String,
    pub sender: ConnectionSender,
}

impl RoomConnection {
    pub fn new(connection_id: impl Into<String>, sender: ConnectionSender) -> Self {
        RoomConnection {
            connection_id: connection_id.into(),
            sender,
        }
    }

    fn deliver(&self, message: ServerMessage) {
        if self.sender.send(message).is_err() {
            debug!(
                "Dropping message for closed connection {}",
                self.connection_id
            );
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    Empty,
    WaitingForSecond,
    Ready,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomKind {
    /// Created on first connect to an unknown game id.
    Open,
    Matchmaking,
    Tournament {
        tournament_id: String,
        match_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachError {
    RoomFull,
    NotAParticipant,
    Closed,
}

impl fmt::Display for AttachError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AttachError::RoomFull => write!(f, "Room is full"),
            AttachError::NotAParticipant => write!(f, "Not a participant of this game"),
            AttachError::Closed => write!(f, "Room has been closed"),
        }
    }
}

impl std::error::Error for AttachError {}

#[derive(Debug, Clone, PartialEq)]
pub enum RoomMessageError {
    UnknownConnection,
    NotHost,
    NotReady,
    GameOver,
    RematchUnavailable,
    InvalidState(GameStateError),
}

impl fmt::Display for RoomMessageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RoomMessageError::UnknownConnection => write!(f, "Connection is not seated in this room"),
            RoomMessageError::NotHost => write!(f, "Only the host may send this message"),
            RoomMessageError::NotReady => write!(f, "Game is not ready"),
            RoomMessageError::GameOver => write!(f, "Game is already over"),
            RoomMessageError::RematchUnavailable => write!(f, "Rematch is not available"),
            RoomMessageError::InvalidState(err) => write!(f, "Invalid update: {}", err),
        }
    }
}

impl std::error::Error for RoomMessageError {}

impl From<GameStateError> for RoomMessageError {
    fn from(error: GameStateError) -> Self {
        RoomMessageError::InvalidState(error)
    }
}

#[derive(Debug)]
pub struct AttachOutcome {
    pub side: Side,
    /// A previous socket of the same user that this attach displaced.
    pub replaced: Option<RoomConnection>,
}

#[derive(Debug, Clone)]
struct Seat {
    player: AuthenticatedIdentity,
    connection: Option<RoomConnection>,
}

/// One match between two seats. The left seat is the host and the only writer
/// of ball and score state.
///
/// Seating follows `Empty -> WaitingForSecond -> Ready -> Finished`. Once the
/// room is `Ready` the roster is fixed: only the two seated users can attach
/// again, each to their own side.
#[derive(Debug)]
pub struct GameRoom {
    game_id: String,
    kind: RoomKind,
    participants: Option<[String; 2]>,
    seats: [Option<Seat>; 2],
    phase: RoomPhase,
    state: GameState,
    played: bool,
    result_recorded: bool,
    rematch_requests: [bool; 2],
    closed: bool,
}

impl GameRoom {
    pub fn new(game_id: impl Into<String>, kind: RoomKind, participants: Option<[String; 2]>) -> Self {
        GameRoom {
            game_id: game_id.into(),
            kind,
            participants,
            seats: [None, None],
            phase: RoomPhase::Empty,
            state: GameState::default(),
            played: false,
            result_recorded: false,
            rematch_requests: [false, false],
            closed: false,
        }
    }

    pub fn open(game_id: impl Into<String>) -> Self {
        Self::new(game_id, RoomKind::Open, None)
    }

    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    /// No live connection in either seat.
    pub fn is_empty(&self) -> bool {
        self.seats
            .iter()
            .all(|seat| seat.as_ref().map_or(true, |s| s.connection.is_none()))
    }

    /// Whether the registry must keep this room after its last connection
    /// left. A tournament match is owed a result from its first moment; a
    /// matchmaking room only once both players reached `Ready`.
    pub fn result_pending(&self) -> bool {
        match self.kind {
            RoomKind::Open => false,
            RoomKind::Matchmaking => self.played && !self.result_recorded,
            RoomKind::Tournament { .. } => !self.result_recorded,
        }
    }

    pub fn connection_count(&self) -> usize {
        self.seats
            .iter()
            .filter(|seat| seat.as_ref().is_some_and(|s| s.connection.is_some()))
            .count()
    }

    pub fn side_of(&self, connection_id: &str) -> Option<Side> {
        self.seats.iter().enumerate().find_map(|(index, seat)| {
            seat.as_ref()
                .and_then(|s| s.connection.as_ref())
                .filter(|c| c.connection_id == connection_id)
                .map(|_| Side::from_index(index))
        })
    }

    pub fn attach(
        &mut self,
        player: AuthenticatedIdentity,
        connection: RoomConnection,
    ) -> Result<AttachOutcome, AttachError> {
        if self.closed {
            return Err(AttachError::Closed);
        }
        let seat = self.seat_index_of_user(&player.user_id);
        if seat.is_none() && matches!(self.phase, RoomPhase::Ready | RoomPhase::Finished) {
            return Err(AttachError::RoomFull);
        }
        if let Some(participants) = &self.participants {
            if !participants.contains(&player.user_id) {
                return Err(AttachError::NotAParticipant);
            }
        }

        // A user already holding a seat always gets that seat back.
        if let Some(index) = seat {
            let side = Side::from_index(index);
            let replaced = self.seats[index]
                .as_mut()
                .and_then(|seat| seat.connection.replace(connection));
            if let Some(old) = &replaced {
                old.deliver(ServerMessage::error("Replaced by a newer connection"));
            }
            debug!(
                "Player {} re-attached to {} side of game {}",
                player.user_id, side, self.game_id
            );
            if matches!(self.phase, RoomPhase::Ready | RoomPhase::Finished) {
                self.send_ready(side);
            }
            return Ok(AttachOutcome { side, replaced });
        }

        match self.phase {
            RoomPhase::Empty => {
                self.seats[Side::Left.index()] = Some(Seat {
                    player,
                    connection: Some(connection),
                });
                self.phase = RoomPhase::WaitingForSecond;
                Ok(AttachOutcome {
                    side: Side::Left,
                    replaced: None,
                })
            }
            RoomPhase::WaitingForSecond => {
                self.seats[Side::Right.index()] = Some(Seat {
                    player,
                    connection: Some(connection),
                });
                self.phase = RoomPhase::Ready;
                self.played = true;
                self.send_ready(Side::Left);
                self.send_ready(Side::Right);
                Ok(AttachOutcome {
                    side: Side::Right,
                    replaced: None,
                })
            }
            RoomPhase::Ready | RoomPhase::Finished => Err(AttachError::RoomFull),
        }
    }

    /// Removes a connection. Returns the match result when leaving decided the
    /// game. Unknown or displaced connection ids are ignored.
    pub fn detach(&mut self, connection_id: &str) -> Option<MatchRecord> {
        let side = self.side_of(connection_id)?;
        let index = side.index();

        match self.phase {
            RoomPhase::Empty => None,
            RoomPhase::WaitingForSecond => {
                self.seats[index] = None;
                self.phase = RoomPhase::Empty;
                None
            }
            RoomPhase::Ready => {
                self.clear_connection(index);
                let remaining = side.opposite();
                self.state.declare_winner(remaining);
                self.phase = RoomPhase::Finished;
                self.send_to(remaining, ServerMessage::OpponentLeft { winner: remaining });
                self.finish(FinishReason::Forfeit)
            }
            RoomPhase::Finished => {
                self.clear_connection(index);
                self.rematch_requests[index] = false;
                None
            }
        }
    }

    pub fn handle_message(
        &mut self,
        connection_id: &str,
        message: ClientMessage,
    ) -> Result<Option<MatchRecord>, RoomMessageError> {
        let side = self
            .side_of(connection_id)
            .ok_or(RoomMessageError::UnknownConnection)?;

        match message {
            ClientMessage::PaddleMove { y } => {
                self.state.apply_paddle(side, y)?;
                self.send_to(side.opposite(), ServerMessage::PaddleUpdate { side, y });
                Ok(None)
            }
            ClientMessage::BallUpdate {
                ball_x,
                ball_y,
                ball_vx,
                ball_vy,
                game_started,
            } => {
                self.require_host_in_play(side)?;
                self.state
                    .apply_ball(ball_x, ball_y, ball_vx, ball_vy, game_started)?;
                self.send_to(
                    Side::Right,
                    ServerMessage::BallUpdate {
                        ball_x,
                        ball_y,
                        ball_vx,
                        ball_vy,
                        game_started,
                    },
                );
                Ok(None)
            }
            ClientMessage::ScoreUpdate {
                left_score,
                right_score,
                ..
            } => {
                self.require_host_in_play(side)?;
                let winner = self.state.apply_score(left_score, right_score)?;
                self.send_to(
                    Side::Right,
                    ServerMessage::ScoreUpdate {
                        left_score,
                        right_score,
                        winner,
                    },
                );
                if winner.is_some() {
                    self.phase = RoomPhase::Finished;
                    return Ok(self.finish(FinishReason::Score));
                }
                Ok(None)
            }
            ClientMessage::GiveUp => {
                self.require_in_play()?;
                let winner = side.opposite();
                self.state.declare_winner(winner);
                self.phase = RoomPhase::Finished;
                self.broadcast(ServerMessage::OpponentLeft { winner });
                Ok(self.finish(FinishReason::Forfeit))
            }
            ClientMessage::PauseGame => {
                self.require_in_play()?;
                self.send_to(side.opposite(), ServerMessage::GamePaused);
                Ok(None)
            }
            ClientMessage::ResumeGame => {
                self.require_in_play()?;
                self.send_to(side.opposite(), ServerMessage::GameResumed);
                Ok(None)
            }
            ClientMessage::RequestRematch => {
                self.request_rematch(side)?;
                Ok(None)
            }
        }
    }

    fn request_rematch(&mut self, side: Side) -> Result<(), RoomMessageError> {
        if self.phase != RoomPhase::Finished || matches!(self.kind, RoomKind::Tournament { .. }) {
            return Err(RoomMessageError::RematchUnavailable);
        }

        self.rematch_requests[side.index()] = true;
        if !self.rematch_requests.iter().all(|requested| *requested) {
            self.send_to(side.opposite(), ServerMessage::RematchRequested { side });
            return Ok(());
        }

        debug!("Both players requested a rematch in game {}", self.game_id);
        self.state = GameState::default();
        self.rematch_requests = [false, false];
        self.result_recorded = false;
        self.phase = RoomPhase::Ready;
        self.send_ready(Side::Left);
        self.send_ready(Side::Right);
        Ok(())
    }

    fn require_in_play(&self) -> Result<(), RoomMessageError> {
        match self.phase {
            RoomPhase::Ready => Ok(()),
            RoomPhase::Finished => Err(RoomMessageError::GameOver),
            RoomPhase::Empty | RoomPhase::WaitingForSecond => Err(RoomMessageError::NotReady),
        }
    }

    fn require_host_in_play(&self, side: Side) -> Result<(), RoomMessageError> {
        if side != Side::Left {
            return Err(RoomMessageError::NotHost);
        }
        self.require_in_play()
    }

    /// Builds the result once per game; a second call for the same game yields
    /// nothing.
    fn finish(&mut self, reason: FinishReason) -> Option<MatchRecord> {
        if self.result_recorded {
            return None;
        }
        let winner = self.state.winner?;
        let left = self.seats[0].as_ref()?.player.user_id.clone();
        let right = self.seats[1].as_ref()?.player.user_id.clone();
        let (winner_id, loser_id) = match winner {
            Side::Left => (left.clone(), right.clone()),
            Side::Right => (right.clone(), left.clone()),
        };
        let (tournament_id, match_id) = match &self.kind {
            RoomKind::Tournament {
                tournament_id,
                match_id,
            } => (Some(tournament_id.clone()), Some(match_id.clone())),
            _ => (None, None),
        };

        self.result_recorded = true;
        Some(MatchRecord {
            game_id: self.game_id.clone(),
            tournament_id,
            match_id,
            winner_id,
            loser_id,
            left_user_id: left,
            right_user_id: right,
            left_score: self.state.left_score,
            right_score: self.state.right_score,
            reason,
            finished_at: Utc::now(),
        })
    }

    fn seat_index_of_user(&self, user_id: &str) -> Option<usize> {
        self.seats
            .iter()
            .position(|seat| seat.as_ref().is_some_and(|s| s.player.user_id == user_id))
    }

    fn clear_connection(&mut self, index: usize) {
        if let Some(seat) = self.seats[index].as_mut() {
            seat.connection = None;
        }
    }

    fn send_ready(&self, side: Side) {
        let (Some(left), Some(right)) = (&self.seats[0], &self.seats[1]) else {
            return;
        };
        self.send_to(
            side,
            ServerMessage::Ready {
                side,
                left_name: left.player.display_name.clone(),
                right_name: right.player.display_name.clone(),
                left_user_id: left.player.user_id.clone(),
                right_user_id: right.player.user_id.clone(),
                state: self.state.clone(),
            },
        );
    }

    fn send_to(&self, side: Side, message: ServerMessage) {
        if let Some(connection) = self.seats[side.index()]
            .as_ref()
            .and_then(|seat| seat.connection.as_ref())
        {
            connection.deliver(message);
        }
    }

    fn broadcast(&self, message: ServerMessage) {
        self.send_to(Side::Left, message.clone());
        self.send_to(Side::Right, message);
    }
}
