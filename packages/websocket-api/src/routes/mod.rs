pub mod websocket;

use axum::{routing::get, Router};
use shared::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/ws", get(websocket::websocket_handler))
}
