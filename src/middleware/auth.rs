//! Authentication extractors
//!
//! Bearer token verification, profile resolution and admin gating.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

use crate::auth::{AuthError, AuthService};
use crate::config::Config;
use crate::error::ApiError;
use crate::models::Profile;

/// Caller identity taken from the `Authorization: Bearer` header
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: Option<String>,
}

/// Extractor for authenticated users
///
/// ```rust,ignore
/// async fn protected_handler(user: AuthenticatedUser) -> impl IntoResponse {
///     format!("Hello, user {}", user.user_id)
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    ApiError::Unauthorized(
                        "Authorization header with Bearer token required".to_string(),
                    )
                })?;

        let auth_service = Arc::<AuthService>::from_ref(state);

        let user = auth_service
            .authenticate(bearer.token())
            .await
            .map_err(|e| match e {
                AuthError::TokenExpired => ApiError::Unauthorized("Token has expired".to_string()),
                AuthError::InvalidToken(reason) => {
                    tracing::debug!(reason = %reason, "Rejected access token");
                    ApiError::Unauthorized("Invalid token".to_string())
                }
                AuthError::Backend(err) => ApiError::Upstream {
                    message: "Failed to verify access token".to_string(),
                    details: Some(err.to_string()),
                },
            })?;

        Ok(AuthenticatedUser {
            user_id: user.id,
            email: user.email,
        })
    }
}

/// Authenticated caller together with their profile row
#[derive(Debug, Clone)]
pub struct ProfileUser {
    pub user: AuthenticatedUser,
    pub profile: Profile,
}

#[async_trait]
impl<S> FromRequestParts<S> for ProfileUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;
        let auth_service = Arc::<AuthService>::from_ref(state);

        let profile = auth_service
            .profile(&user.user_id)
            .await
            .map_err(|e| ApiError::Upstream {
                message: "Failed to load profile".to_string(),
                details: Some(e.to_string()),
            })?
            .ok_or_else(|| ApiError::Forbidden("Profile not found".to_string()))?;

        if !profile.active {
            return Err(ApiError::Forbidden("Account is inactive".to_string()));
        }

        Ok(ProfileUser { user, profile })
    }
}

/// Caller whose profile has `user_type = admin`
pub struct AdminUser(pub ProfileUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let caller = ProfileUser::from_request_parts(parts, state).await?;

        if !caller.profile.user_type.is_admin() {
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }

        Ok(AdminUser(caller))
    }
}

/// Internal caller presenting the service role key, used by the purchase
/// status functions
#[derive(Debug, Clone, Copy)]
pub struct ServiceRoleCaller;

#[async_trait]
impl<S> FromRequestParts<S> for ServiceRoleCaller
where
    Arc<Config>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    ApiError::Unauthorized(
                        "Authorization header with Bearer token required".to_string(),
                    )
                })?;

        let config = Arc::<Config>::from_ref(state);
        if !keys_match(bearer.token(), &config.supabase_service_role_key) {
            tracing::warn!("Status function called without the service role key");
            return Err(ApiError::Unauthorized("Service role key required".to_string()));
        }

        Ok(ServiceRoleCaller)
    }
}

/// Constant-time key comparison: both values are MACed under the expected key
/// and the digests compared with `verify_slice`.
fn keys_match(presented: &str, expected: &str) -> bool {
    let Ok(mut reference) = Hmac::<Sha256>::new_from_slice(expected.as_bytes()) else {
        return false;
    };
    reference.update(expected.as_bytes());
    let digest = reference.finalize().into_bytes();

    let Ok(mut candidate) = Hmac::<Sha256>::new_from_slice(expected.as_bytes()) else {
        return false;
    };
    candidate.update(presented.as_bytes());
    candidate.verify_slice(&digest).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_match() {
        assert!(keys_match("service-role", "service-role"));
        assert!(!keys_match("service-rolf", "service-role"));
        assert!(!keys_match("service", "service-role"));
        assert!(!keys_match("", "service-role"));
    }
}
