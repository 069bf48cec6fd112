pub mod match_result_repository_errors;
pub mod queue_repository_errors;
pub mod room_repository_errors;
pub mod tournament_repository_errors;
