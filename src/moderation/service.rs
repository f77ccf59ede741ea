//! Submission moderation gateway
//!
//! Authorizes a moderation action against the caller's profile and forwards
//! it to the matching stored procedure. The submission state machine itself
//! lives in those procedures.

use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::auth::AuthService;
use crate::baas::{Baas, BaasError};
use crate::error::ApiError;
use crate::models::UserType;

use super::model::{ModerationAction, ModerationRequest, ModerationRequestBody, ModerationResponse};

/// Gateway errors
#[derive(Error, Debug)]
pub enum ModerationError {
    #[error("Invalid JSON body: {0}")]
    InvalidBody(String),

    #[error("submission_id and action are required")]
    MissingFields,

    #[error("Invalid action: {0}")]
    UnknownAction(String),

    #[error("Profile not found")]
    ProfileNotFound,

    #[error("Action {action} requires role {expected}, but caller has role {actual}")]
    RoleMismatch {
        action: ModerationAction,
        expected: String,
        actual: String,
    },

    #[error("Failed to load profile: {0}")]
    ProfileLookup(BaasError),

    #[error("Remote procedure {rpc_name} failed: {source}")]
    RpcFailed {
        rpc_name: String,
        rpc_params: Value,
        source: BaasError,
    },
}

impl From<ModerationError> for ApiError {
    fn from(err: ModerationError) -> Self {
        match err {
            ModerationError::InvalidBody(_)
            | ModerationError::MissingFields
            | ModerationError::UnknownAction(_) => ApiError::BadRequest(err.to_string()),
            ModerationError::ProfileNotFound | ModerationError::RoleMismatch { .. } => {
                ApiError::Forbidden(err.to_string())
            }
            ModerationError::ProfileLookup(source) => ApiError::Upstream {
                message: "Failed to load profile".to_string(),
                details: Some(source.to_string()),
            },
            ModerationError::RpcFailed {
                rpc_name,
                rpc_params,
                source,
            } => ApiError::RpcFailed {
                rpc_name,
                rpc_params,
                details: source.to_string(),
            },
        }
    }
}

/// Parse and validate a raw request body
pub fn parse_request(body: &[u8]) -> Result<ModerationRequest, ModerationError> {
    let raw: ModerationRequestBody =
        serde_json::from_slice(body).map_err(|e| ModerationError::InvalidBody(e.to_string()))?;

    let submission_id = raw
        .submission_id
        .filter(|id| !id.trim().is_empty())
        .ok_or(ModerationError::MissingFields)?;
    let action = raw
        .action
        .filter(|a| !a.trim().is_empty())
        .ok_or(ModerationError::MissingFields)?;

    let action = action
        .parse::<ModerationAction>()
        .map_err(|_| ModerationError::UnknownAction(action.clone()))?;

    Ok(ModerationRequest {
        submission_id,
        action,
    })
}

/// Role-gated dispatcher for moderation procedures
pub struct ModerationGateway {
    baas: Arc<dyn Baas>,
    auth: Arc<AuthService>,
}

impl ModerationGateway {
    pub fn new(baas: Arc<dyn Baas>, auth: Arc<AuthService>) -> Self {
        Self { baas, auth }
    }

    /// Authorize `request` for `caller_id` and invoke its procedure once
    pub async fn dispatch(
        &self,
        caller_id: &str,
        request: &ModerationRequest,
    ) -> Result<ModerationResponse, ModerationError> {
        let profile = self
            .auth
            .profile(caller_id)
            .await
            .map_err(ModerationError::ProfileLookup)?
            .ok_or(ModerationError::ProfileNotFound)?;

        let route = request.action.route();
        Self::authorize(request.action, &profile.user_type)?;

        let rpc_params = route.params(&request.submission_id, caller_id);

        tracing::info!(
            action = %request.action,
            rpc = route.rpc_name,
            submission_id = %request.submission_id,
            caller_id = %caller_id,
            "Dispatching moderation action"
        );

        let data = self
            .baas
            .rpc(route.rpc_name, rpc_params.clone())
            .await
            .map_err(|source| {
                tracing::error!(
                    rpc = route.rpc_name,
                    submission_id = %request.submission_id,
                    error = %source,
                    "Moderation procedure failed"
                );
                ModerationError::RpcFailed {
                    rpc_name: route.rpc_name.to_string(),
                    rpc_params,
                    source,
                }
            })?;

        Ok(ModerationResponse {
            success: true,
            message: format!("Action {} executed successfully", request.action),
            rpc_name: route.rpc_name.to_string(),
            data,
        })
    }

    fn authorize(action: ModerationAction, user_type: &UserType) -> Result<(), ModerationError> {
        let route = action.route();
        if route.permits(user_type) {
            return Ok(());
        }

        tracing::warn!(
            action = %action,
            user_type = %user_type,
            "Moderation action denied for caller role"
        );
        Err(ModerationError::RoleMismatch {
            action,
            expected: route.expected_roles(),
            actual: user_type.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baas::MemoryBaas;
    use serde_json::json;

    fn gateway_with(profiles: &[(&str, &str)]) -> (Arc<MemoryBaas>, ModerationGateway) {
        let baas = Arc::new(MemoryBaas::new());
        for (id, user_type) in profiles {
            baas.seed("profiles", json!({ "id": id, "user_type": user_type }));
        }
        let auth = Arc::new(AuthService::new(baas.clone(), None));
        let gateway = ModerationGateway::new(baas.clone(), auth);
        (baas, gateway)
    }

    fn request(submission_id: &str, action: ModerationAction) -> ModerationRequest {
        ModerationRequest {
            submission_id: submission_id.to_string(),
            action,
        }
    }

    #[test]
    fn test_parse_request() {
        let parsed = parse_request(br#"{"submission_id":"sub-1","action":"ADMIN_REJECT"}"#).unwrap();
        assert_eq!(parsed.action, ModerationAction::AdminReject);

        assert!(matches!(
            parse_request(b"not json"),
            Err(ModerationError::InvalidBody(_))
        ));
        assert!(matches!(
            parse_request(br#"{"action":"ADMIN_REJECT"}"#),
            Err(ModerationError::MissingFields)
        ));
        assert!(matches!(
            parse_request(br#"{"submission_id":"","action":"ADMIN_REJECT"}"#),
            Err(ModerationError::MissingFields)
        ));
        assert!(matches!(
            parse_request(br#"{"submission_id":"s","action":"DELETE_EVERYTHING"}"#),
            Err(ModerationError::UnknownAction(a)) if a == "DELETE_EVERYTHING"
        ));
    }

    #[tokio::test]
    async fn test_advertiser_reject_goes_to_second_instance() {
        let (baas, gateway) = gateway_with(&[("adv-1", "anunciante")]);
        baas.respond_with("reject_submission_to_second_instance", json!({ "status": "second_instance_pending" }));

        let response = gateway
            .dispatch("adv-1", &request("sub-42", ModerationAction::AdvertiserRejectToSecondInstance))
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.rpc_name, "reject_submission_to_second_instance");
        assert_eq!(response.data["status"], "second_instance_pending");

        let calls = baas.rpc_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].params,
            json!({ "p_submission_id": "sub-42", "p_advertiser_id": "adv-1" })
        );
    }

    #[tokio::test]
    async fn test_admin_reject_refuses_advertiser() {
        let (baas, gateway) = gateway_with(&[("adv-1", "anunciante")]);

        let err = gateway
            .dispatch("adv-1", &request("sub-1", ModerationAction::AdminReject))
            .await
            .unwrap_err();

        match &err {
            ModerationError::RoleMismatch { expected, actual, .. } => {
                assert_eq!(expected, "admin");
                assert_eq!(actual, "anunciante");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(baas.rpc_calls().is_empty());
    }

    #[tokio::test]
    async fn test_admin_may_run_advertiser_actions() {
        let (baas, gateway) = gateway_with(&[("admin-1", "admin")]);

        gateway
            .dispatch("admin-1", &request("sub-1", ModerationAction::AdvertiserApproveSecondInstance))
            .await
            .unwrap();

        let calls = baas.rpc_calls();
        assert_eq!(calls[0].name, "approve_submission_second_instance");
        assert_eq!(calls[0].params["p_advertiser_id"], "admin-1");
    }

    #[tokio::test]
    async fn test_missing_profile() {
        let (baas, gateway) = gateway_with(&[]);
        let err = gateway
            .dispatch("ghost", &request("sub-1", ModerationAction::AdminReject))
            .await
            .unwrap_err();
        assert!(matches!(err, ModerationError::ProfileNotFound));
        assert!(baas.rpc_calls().is_empty());
    }

    #[tokio::test]
    async fn test_procedure_failure_keeps_diagnostics() {
        let (baas, gateway) = gateway_with(&[("admin-1", "admin")]);
        baas.fail_rpc("admin_return_submission_to_advertiser", "submission already finalized");

        let err = gateway
            .dispatch("admin-1", &request("sub-9", ModerationAction::AdminReturnToAdvertiser))
            .await
            .unwrap_err();

        let api: ApiError = err.into();
        match api {
            ApiError::RpcFailed { rpc_name, rpc_params, details } => {
                assert_eq!(rpc_name, "admin_return_submission_to_advertiser");
                assert_eq!(rpc_params["p_admin_id"], "admin-1");
                assert!(details.contains("already finalized"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
