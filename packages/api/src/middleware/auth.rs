use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;
use shared::services::auth_service::AuthServiceTrait;
use shared::state::AppState;

/// The caller named by the bearer token's `sub` claim.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub display_name: String,
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .ok_or(ApiError::Unauthorized)?
            .to_str()
            .map_err(|_| ApiError::Unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;

        let identity = state.auth_service.authenticate(token)?;

        Ok(AuthenticatedUser {
            user_id: identity.user_id,
            display_name: identity.display_name,
        })
    }
}
