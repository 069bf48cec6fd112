use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::models::auth::responses::{LoginResponse, TokenClaims};
use crate::models::auth::AuthenticatedIdentity;
use crate::services::errors::auth_service_errors::AuthServiceError;

#[cfg(test)]
use mockall::automock;

const TOKEN_LIFETIME_HOURS: i64 = 24;

/// Verifies tokens issued by the account service. Both sides share the HS256
/// secret; this service never looks users up.
#[cfg_attr(test, automock)]
pub trait AuthServiceTrait: Send + Sync {
    fn verify_token(&self, token: &str) -> Result<TokenClaims, AuthServiceError>;
    fn authenticate(&self, token: &str) -> Result<AuthenticatedIdentity, AuthServiceError>;
    fn generate_token(
        &self,
        user_id: &str,
        display_name: Option<String>,
    ) -> Result<LoginResponse, AuthServiceError>;
}

pub struct AuthService {
    jwt_secret: String,
}

impl AuthService {
    pub fn new(jwt_secret: String) -> Self {
        AuthService { jwt_secret }
    }
}

impl AuthServiceTrait for AuthService {
    fn generate_token(
        &self,
        user_id: &str,
        display_name: Option<String>,
    ) -> Result<LoginResponse, AuthServiceError> {
        if user_id.trim().is_empty() {
            return Err(AuthServiceError::ValidationError(
                "User id cannot be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let expires_in = TOKEN_LIFETIME_HOURS * 60 * 60;
        let exp = (now + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp() as usize;
        let iat = now.timestamp() as usize;

        let claims = TokenClaims {
            sub: user_id.to_string(),
            exp,
            iat,
            name: display_name,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )
        .map_err(|e| AuthServiceError::JwtError(format!("{:#?}", e)))?;

        Ok(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in,
        })
    }

    fn verify_token(&self, token: &str) -> Result<TokenClaims, AuthServiceError> {
        if token.is_empty() {
            return Err(AuthServiceError::MissingToken);
        }

        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_ref());
        let validation = Validation::default();

        match decode::<TokenClaims>(token, &decoding_key, &validation) {
            Ok(token_data) => {
                let now = Utc::now().timestamp() as usize;
                if token_data.claims.exp < now {
                    Err(AuthServiceError::ExpiredToken)
                } else if token_data.claims.sub.trim().is_empty() {
                    Err(AuthServiceError::InvalidToken)
                } else {
                    Ok(token_data.claims)
                }
            }
            Err(err) => match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    Err(AuthServiceError::ExpiredToken)
                }
                _ => Err(AuthServiceError::InvalidToken),
            },
        }
    }

    fn authenticate(&self, token: &str) -> Result<AuthenticatedIdentity, AuthServiceError> {
        let claims = self.verify_token(token)?;
        let display_name = claims
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| claims.sub.clone());
        Ok(AuthenticatedIdentity {
            user_id: claims.sub,
            display_name,
        })
    }
}
