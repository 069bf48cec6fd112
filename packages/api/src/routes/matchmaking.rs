use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use crate::{error::ApiError, middleware::auth::AuthenticatedUser};
use shared::models::matchmaking::responses::MatchmakingResponse;
use shared::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/matchmaking/join", post(join_queue))
        .route("/matchmaking/leave", post(leave_queue))
        .route("/matchmaking/status", get(queue_status))
}

async fn join_queue(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
) -> Result<Json<MatchmakingResponse>, ApiError> {
    info!("Player {} joining matchmaking", authenticated_user.user_id);
    let outcome = state
        .matchmaking_service
        .join(&authenticated_user.user_id)
        .await?;
    Ok(Json(outcome.into()))
}

async fn leave_queue(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
) -> Result<StatusCode, ApiError> {
    state
        .matchmaking_service
        .leave(&authenticated_user.user_id)
        .await?;
    Ok(StatusCode::OK)
}

async fn queue_status(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
) -> Result<Json<MatchmakingResponse>, ApiError> {
    let status = state
        .matchmaking_service
        .status(&authenticated_user.user_id)
        .await?;
    Ok(Json(status.into()))
}
