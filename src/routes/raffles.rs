use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn raffle_routes() -> Router<AppState> {
    Router::new()
        .route("/api/raffles", get(list_raffles))
        .route("/api/admin/raffles/:id/draw", post(draw_raffle))
}
