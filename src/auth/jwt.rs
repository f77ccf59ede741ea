//! Supabase access token verification
//!
//! Supabase signs access tokens with the project's HS256 JWT secret and the
//! `authenticated` audience.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Audience Supabase puts on signed-in user tokens
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// JWT-related errors
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Token decoding failed: {0}")]
    DecodingFailed(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// Claims carried by a Supabase access token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (auth user ID)
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Postgres role (`authenticated`, `service_role`, ...)
    #[serde(default)]
    pub role: Option<String>,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Claims for a signed-in user, valid for `ttl_seconds`
    pub fn for_user(user_id: &str, email: Option<String>, ttl_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            email,
            role: Some(AUTHENTICATED_AUDIENCE.to_string()),
            aud: AUTHENTICATED_AUDIENCE.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ttl_seconds)).timestamp(),
        }
    }
}

/// Sign claims with the project secret
pub fn sign_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::EncodingFailed(e.to_string()))
}

/// Verify and decode an access token
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_audience(&[AUTHENTICATED_AUDIENCE]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        _ => JwtError::DecodingFailed(e.to_string()),
    })?;

    if token_data.claims.sub.is_empty() {
        return Err(JwtError::InvalidToken("missing subject".to_string()));
    }

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let claims = Claims::for_user("user-1", Some("ana@example.com".to_string()), 900);
        let token = sign_token(&claims, "test-secret").unwrap();

        let decoded = verify_token(&token, "test-secret").unwrap();
        assert_eq!(decoded.sub, "user-1");
        assert_eq!(decoded.email.as_deref(), Some("ana@example.com"));
    }

    #[test]
    fn test_wrong_secret() {
        let token = sign_token(&Claims::for_user("user-1", None, 900), "secret1").unwrap();
        assert!(verify_token(&token, "secret2").is_err());
    }

    #[test]
    fn test_expired_token() {
        let token = sign_token(&Claims::for_user("user-1", None, -3600), "s").unwrap();
        assert!(matches!(
            verify_token(&token, "s"),
            Err(JwtError::TokenExpired)
        ));
    }

    #[test]
    fn test_wrong_audience() {
        let mut claims = Claims::for_user("user-1", None, 900);
        claims.aud = "anon".to_string();
        let token = sign_token(&claims, "s").unwrap();
        assert!(verify_token(&token, "s").is_err());
    }

    #[test]
    fn test_garbage_token() {
        assert!(verify_token("invalid.token.here", "s").is_err());
    }
}
