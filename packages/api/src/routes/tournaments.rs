use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use crate::{error::ApiError, middleware::auth::AuthenticatedUser};
use shared::models::tournament::requests::{CreateTournamentRequest, ReportResultRequest};
use shared::models::tournament::responses::{
    ReadyResponse, ReportResultResponse, TournamentSummary,
};
use shared::models::tournament::{Tournament, TournamentMatch};
use shared::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tournaments", post(create_tournament).get(list_tournaments))
        .route("/tournaments/{tournament_id}", get(get_tournament))
        .route("/tournaments/{tournament_id}/join", post(join_tournament))
        .route(
            "/tournaments/{tournament_id}/matches/upcoming",
            get(upcoming_matches),
        )
        .route("/tournaments/matches/{match_id}/ready", post(mark_ready))
        .route("/tournaments/matches/{match_id}/result", post(report_result))
}

async fn create_tournament(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Json(payload): Json<CreateTournamentRequest>,
) -> Result<(StatusCode, Json<TournamentSummary>), ApiError> {
    info!(
        "Player {} creating tournament {}",
        authenticated_user.user_id, payload.name
    );
    let tournament = state
        .tournament_service
        .create_tournament(&payload.name, payload.size, payload.start_date)
        .await?;
    Ok((StatusCode::CREATED, Json(TournamentSummary::from(&tournament))))
}

async fn list_tournaments(
    State(state): State<AppState>,
    _authenticated_user: AuthenticatedUser,
) -> Result<Json<Vec<TournamentSummary>>, ApiError> {
    let tournaments = state.tournament_service.list_tournaments().await?;
    Ok(Json(tournaments.iter().map(TournamentSummary::from).collect()))
}

async fn get_tournament(
    State(state): State<AppState>,
    _authenticated_user: AuthenticatedUser,
    Path(tournament_id): Path<String>,
) -> Result<Json<Tournament>, ApiError> {
    Ok(Json(
        state.tournament_service.get_tournament(&tournament_id).await?,
    ))
}

async fn join_tournament(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(tournament_id): Path<String>,
) -> Result<Json<TournamentSummary>, ApiError> {
    let tournament = state
        .tournament_service
        .join_tournament(&tournament_id, &authenticated_user.user_id)
        .await?;
    Ok(Json(TournamentSummary::from(&tournament)))
}

async fn upcoming_matches(
    State(state): State<AppState>,
    _authenticated_user: AuthenticatedUser,
    Path(tournament_id): Path<String>,
) -> Result<Json<Vec<TournamentMatch>>, ApiError> {
    Ok(Json(
        state
            .tournament_service
            .get_upcoming_matches(&tournament_id)
            .await?,
    ))
}

async fn mark_ready(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(match_id): Path<String>,
) -> Result<Json<ReadyResponse>, ApiError> {
    let outcome = state
        .tournament_service
        .mark_ready(&match_id, &authenticated_user.user_id)
        .await?;
    Ok(Json(outcome.into()))
}

async fn report_result(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(match_id): Path<String>,
    Json(payload): Json<ReportResultRequest>,
) -> Result<Json<ReportResultResponse>, ApiError> {
    info!(
        "Player {} reporting result for match {}",
        authenticated_user.user_id, match_id
    );
    let report = state
        .tournament_service
        .report_match_result(
            &match_id,
            &authenticated_user.user_id,
            &payload.winner_id,
            &payload.scores,
            payload.forfeit,
        )
        .await?;
    Ok(Json(ReportResultResponse {
        accepted: true,
        duplicate: report.duplicate,
    }))
}
