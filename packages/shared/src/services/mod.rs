pub mod auth_service;
pub mod errors;
pub mod game_room_service;
pub mod matchmaking_service;
pub mod tournament_service;
pub mod websocket_service;
