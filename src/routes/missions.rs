//! Mission route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn mission_routes() -> Router<AppState> {
    Router::new()
        .route("/api/missions", get(list_missions))
        .route("/api/missions/:id/submissions", post(submit_mission))
        .route("/api/submissions/:id/validate", post(validate_submission))
}
