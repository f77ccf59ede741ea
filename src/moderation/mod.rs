//! Submission moderation domain module
//!
//! Contains the action dispatch table and the role-gated gateway.

mod model;
mod service;

pub use model::*;
pub use service::{parse_request, ModerationError, ModerationGateway};
