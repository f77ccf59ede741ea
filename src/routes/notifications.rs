use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/notifications",
            get(list_notifications).post(create_notification),
        )
        .route(
            "/api/notifications/read-all",
            post(mark_all_notifications_read),
        )
        .route("/api/notifications/:id/read", post(mark_notification_read))
        .route("/api/notifications/:id", delete(delete_notification))
}
