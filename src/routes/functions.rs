//! Edge-function compatible routes

use axum::{routing::post, Router};

use crate::handlers::*;
use crate::state::AppState;

pub fn moderation_routes() -> Router<AppState> {
    Router::new().route(
        "/functions/v1/moderate-submission",
        post(moderate_submission),
    )
}

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/functions/v1/mercadopago-webhook", post(mercadopago_webhook))
        .route(
            "/functions/v1/mercadopago-rifa-webhook",
            post(mercadopago_rifa_webhook),
        )
        .route(
            "/functions/v1/update-credit-purchase-status",
            post(update_credit_purchase_status),
        )
        .route(
            "/functions/v1/update-rifa-purchase-status",
            post(update_rifa_purchase_status),
        )
}
