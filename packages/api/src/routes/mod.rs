pub mod health;
pub mod matchmaking;
pub mod tournaments;
