//! Centralized API error handling for PremiAds
//!
//! Every handler returns [`ApiResult`]. Errors render as a flat JSON body
//! `{ "error": ..., "code": ... }`, extended with `details`, `rpc_name` and
//! `rpc_params` when a remote procedure or downstream function failed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upstream error: {message}")]
    Upstream {
        message: String,
        details: Option<String>,
    },

    #[error("Remote procedure {rpc_name} failed: {details}")]
    RpcFailed {
        rpc_name: String,
        rpc_params: Value,
        details: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// JSON error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_params: Option<Value>,
}

impl ApiError {
    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            ApiError::Configuration(_) => "CONFIGURATION_ERROR",
            ApiError::Upstream { .. } => "UPSTREAM_ERROR",
            ApiError::RpcFailed { .. } => "RPC_FAILED",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::RpcFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message shown in the `error` field, without the variant prefix
    pub fn public_message(&self) -> String {
        match self {
            ApiError::NotFound(m)
            | ApiError::BadRequest(m)
            | ApiError::Unauthorized(m)
            | ApiError::Forbidden(m)
            | ApiError::Conflict(m)
            | ApiError::InternalError(m)
            | ApiError::ServiceUnavailable(m)
            | ApiError::Configuration(m)
            | ApiError::ValidationError(m) => m.clone(),
            ApiError::Upstream { message, .. } => message.clone(),
            ApiError::RpcFailed { rpc_name, .. } => {
                format!("Failed to execute {}", rpc_name)
            }
        }
    }

    fn into_body(self) -> ErrorResponse {
        let error = self.public_message();
        let code = self.error_code();
        match self {
            ApiError::Upstream { details, .. } => ErrorResponse {
                error,
                code,
                details,
                rpc_name: None,
                rpc_params: None,
            },
            ApiError::RpcFailed {
                rpc_name,
                rpc_params,
                details,
            } => ErrorResponse {
                error,
                code,
                details: Some(details),
                rpc_name: Some(rpc_name),
                rpc_params: Some(rpc_params),
            },
            _ => ErrorResponse {
                error,
                code,
                details: None,
                rpc_name: None,
                rpc_params: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        let error_code = self.error_code();

        if status.is_server_error() {
            tracing::error!(error = %message, code = %error_code, "Server error occurred");
        } else {
            tracing::debug!(error = %message, code = %error_code, "Client error occurred");
        }

        (status, Json(self.into_body())).into_response()
    }
}

// Convenience conversions from common error types

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::BadRequest(format!("Invalid JSON: {}", err))
    }
}

/// Result type alias using ApiError
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::NotFound("x".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Forbidden("x".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Configuration("x".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_plain_body_has_only_error_and_code() {
        let body = serde_json::to_value(ApiError::BadRequest("missing".to_string()).into_body())
            .unwrap();
        assert_eq!(body, json!({ "error": "missing", "code": "BAD_REQUEST" }));
    }

    #[test]
    fn test_rpc_failure_body_carries_diagnostics() {
        let err = ApiError::RpcFailed {
            rpc_name: "admin_reject_submission".to_string(),
            rpc_params: json!({ "p_submission_id": "sub-1" }),
            details: "permission denied".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = serde_json::to_value(err.into_body()).unwrap();
        assert_eq!(body["rpc_name"], "admin_reject_submission");
        assert_eq!(body["rpc_params"]["p_submission_id"], "sub-1");
        assert_eq!(body["details"], "permission denied");
    }
}
