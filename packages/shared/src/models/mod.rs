pub mod auth;
pub mod game_room;
pub mod game_session;
pub mod matchmaking;
pub mod messages;
pub mod tournament;
