pub mod auth_service_errors;
pub mod game_room_service_errors;
pub mod matchmaking_service_errors;
pub mod tournament_service_errors;
