//! Request tracing middleware
//!
//! Every request runs inside a span carrying its request id, so service logs
//! emitted while handling it can be correlated. Edge-function calls are tagged
//! with the function name, and webhook deliveries record whether a signature
//! header was present.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

const FUNCTIONS_PREFIX: &str = "/functions/v1/";
const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Edge-function name for `/functions/v1/<name>` paths
pub fn function_name(path: &str) -> Option<&str> {
    path.strip_prefix(FUNCTIONS_PREFIX)
        .map(|rest| rest.trim_end_matches('/'))
        .filter(|name| !name.is_empty() && !name.contains('/'))
}

fn is_webhook(function: Option<&str>) -> bool {
    function.is_some_and(|name| name.ends_with("-webhook"))
}

/// Middleware for logging request information with timing
pub async fn request_tracing(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get(&REQUEST_ID)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let function = function_name(&path).map(str::to_string);
    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %path,
        function = function.as_deref().unwrap_or("-"),
    );

    if is_webhook(function.as_deref()) {
        let signed = request.headers().contains_key("x-signature");
        span.in_scope(|| tracing::info!(signed, "Webhook delivery received"));
    } else {
        let client_ip = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(|s| s.trim().to_string());
        span.in_scope(|| tracing::debug!(client_ip = ?client_ip, "Request started"));
    }

    let start = Instant::now();
    let mut response = next.run(request).instrument(span.clone()).await;
    let duration_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();

    span.in_scope(|| {
        if response.status().is_server_error() {
            tracing::error!(status, duration_ms, "Request failed");
        } else if response.status().is_client_error() {
            tracing::warn!(status, duration_ms, "Request rejected");
        } else {
            tracing::info!(status, duration_ms, "Request completed");
        }
    });

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_name() {
        assert_eq!(
            function_name("/functions/v1/mercadopago-webhook"),
            Some("mercadopago-webhook")
        );
        assert_eq!(
            function_name("/functions/v1/moderate-submission/"),
            Some("moderate-submission")
        );
        assert_eq!(function_name("/functions/v1/"), None);
        assert_eq!(function_name("/api/missions"), None);
    }

    #[test]
    fn test_webhook_detection() {
        assert!(is_webhook(Some("mercadopago-rifa-webhook")));
        assert!(!is_webhook(Some("update-credit-purchase-status")));
        assert!(!is_webhook(None));
    }
}
