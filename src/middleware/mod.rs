//! Middleware for the PremiAds API
//!
//! Request tracing and the authentication extractors.

pub mod auth;
mod tracing;

pub use auth::{AdminUser, AuthenticatedUser, ProfileUser, ServiceRoleCaller};
pub use tracing::request_tracing;
