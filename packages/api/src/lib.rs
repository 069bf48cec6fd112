use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

use shared::state::AppState;

pub mod error;
pub mod middleware;
pub mod routes;

/// HTTP routes and the `/ws` endpoint on one router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .merge(routes::matchmaking::routes())
        .merge(routes::tournaments::routes())
        .merge(websocket_api::routes())
        .layer(cors)
        .with_state(state)
}
