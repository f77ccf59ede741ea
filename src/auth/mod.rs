//! Authentication module for PremiAds
//!
//! Callers authenticate with Supabase access tokens. Roles come from the
//! `profiles.user_type` column, never from the token.

mod jwt;
mod service;

pub use jwt::{sign_token, verify_token, Claims, JwtError, AUTHENTICATED_AUDIENCE};
pub use service::{AuthError, AuthService};
