pub mod errors;
pub mod match_result_repository;
pub mod queue_repository;
pub mod room_repository;
pub mod tournament_repository;
pub mod websocket_repository;
