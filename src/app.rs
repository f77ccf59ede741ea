//! Router assembly

use axum::{
    extract::State,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::middleware::request_tracing;
use crate::routes;
use crate::state::AppState;

/// Build the full application router
pub fn build_router(state: AppState) -> Router {
    let functions = Router::new()
        .merge(routes::moderation_routes())
        .merge(routes::payment_routes())
        .layer(functions_cors());

    let api = Router::new()
        .merge(routes::mission_routes())
        .merge(routes::raffle_routes())
        .merge(routes::notification_routes())
        .merge(routes::admin_routes())
        .layer(configure_cors(state.config.cors_allowed_origins.as_deref()));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(functions)
        .merge(api)
        .with_state(state)
        .layer(axum::middleware::from_fn(request_tracing))
}

/// CORS for the edge-function routes, which are called by the provider and
/// by the Supabase JS client
pub fn functions_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            CONTENT_TYPE,
            HeaderName::from_static("x-signature"),
        ])
}

/// CORS for the `/api` surface
pub fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let Some(allowed_origins) = allowed_origins.filter(|s| !s.trim().is_empty()) else {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

async fn root() -> &'static str {
    "PremiAds API Server"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    environment: &'static str,
    payments: &'static str,
    version: &'static str,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let payments = if state.config.mercado_pago_access_token.is_some() {
        "configured"
    } else {
        "disabled"
    };

    Json(HealthResponse {
        status: "healthy",
        environment: state.config.environment.as_str(),
        payments,
        version: env!("CARGO_PKG_VERSION"),
    })
}
