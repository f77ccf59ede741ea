//! Missions domain module
//!
//! Per-participant mission status and submission intake.

mod model;
mod service;

pub use model::*;
pub use service::{MissionError, MissionService, FINALIZE_SUBMISSION};
