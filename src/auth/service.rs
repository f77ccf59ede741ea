//! Access token resolution and profile lookup

use std::sync::Arc;
use thiserror::Error;

use crate::baas::{first_row, AuthUser, Baas, BaasError, Query};
use crate::models::Profile;

use super::jwt::{verify_token, JwtError};

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Backend error: {0}")]
    Backend(#[from] BaasError),
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::TokenExpired => AuthError::TokenExpired,
            other => AuthError::InvalidToken(other.to_string()),
        }
    }
}

/// Resolves bearer tokens to users.
///
/// With a JWT secret configured tokens are verified locally; otherwise the
/// token is sent to the auth endpoint, which also catches revoked sessions.
#[derive(Clone)]
pub struct AuthService {
    baas: Arc<dyn Baas>,
    jwt_secret: Option<String>,
}

impl AuthService {
    pub fn new(baas: Arc<dyn Baas>, jwt_secret: Option<String>) -> Self {
        Self { baas, jwt_secret }
    }

    /// Resolve the user behind an access token
    pub async fn authenticate(&self, token: &str) -> Result<AuthUser, AuthError> {
        if let Some(secret) = &self.jwt_secret {
            let claims = verify_token(token, secret)?;
            return Ok(AuthUser {
                id: claims.sub,
                email: claims.email,
            });
        }

        match self.baas.get_user(token).await {
            Ok(user) => Ok(user),
            Err(BaasError::Unauthorized) => {
                Err(AuthError::InvalidToken("rejected by auth provider".to_string()))
            }
            Err(e) => Err(AuthError::Backend(e)),
        }
    }

    /// Load the caller's profile row
    pub async fn profile(&self, user_id: &str) -> Result<Option<Profile>, BaasError> {
        let rows = self
            .baas
            .select(&Query::table("profiles").eq("id", user_id).limit(1))
            .await?;
        first_row(rows)
    }
}
