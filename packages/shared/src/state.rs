use std::sync::Arc;

use crate::repositories::match_result_repository::{
    InMemoryMatchResultRepository, MatchResultRepository,
};
use crate::repositories::queue_repository::InMemoryQueueRepository;
use crate::repositories::room_repository::InMemoryGameRoomRepository;
use crate::repositories::tournament_repository::InMemoryTournamentRepository;
use crate::repositories::websocket_repository::InMemoryWebSocketRepository;
use crate::services::auth_service::AuthService;
use crate::services::game_room_service::GameRoomService;
use crate::services::matchmaking_service::MatchmakingService;
use crate::services::tournament_service::TournamentService;
use crate::services::websocket_service::WebSocketService;

/// Everything a request or socket handler needs. Built once per server (or
/// per test) so no registry outlives its owner.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub matchmaking_service: Arc<MatchmakingService>,
    pub game_room_service: Arc<GameRoomService>,
    pub tournament_service: Arc<TournamentService>,
    pub websocket_service: Arc<WebSocketService>,
}

impl AppState {
    pub fn in_memory(jwt_secret: String) -> Self {
        Self::with_match_results(jwt_secret, Arc::new(InMemoryMatchResultRepository::new()))
    }

    /// Same wiring, with a caller-supplied stats store.
    pub fn with_match_results(
        jwt_secret: String,
        results: Arc<dyn MatchResultRepository + Send + Sync>,
    ) -> Self {
        let rooms = Arc::new(InMemoryGameRoomRepository::new());
        let websocket_service = Arc::new(WebSocketService::new(Arc::new(
            InMemoryWebSocketRepository::new(),
        )));
        let tournament_service = Arc::new(TournamentService::new(
            Arc::new(InMemoryTournamentRepository::new()),
            rooms.clone(),
            websocket_service.clone(),
        ));
        let game_room_service = Arc::new(GameRoomService::new(
            rooms.clone(),
            results,
            tournament_service.clone(),
        ));
        let matchmaking_service = Arc::new(MatchmakingService::new(
            Arc::new(InMemoryQueueRepository::new()),
            rooms,
            websocket_service.clone(),
        ));

        AppState {
            auth_service: Arc::new(AuthService::new(jwt_secret)),
            matchmaking_service,
            game_room_service,
            tournament_service,
            websocket_service,
        }
    }
}
