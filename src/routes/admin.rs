//! Admin route definitions

use axum::{routing::post, Router};

use crate::handlers::*;
use crate::state::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/users/:id/credits", post(grant_credits))
        .route("/api/admin/users/:id/points", post(grant_points))
}
