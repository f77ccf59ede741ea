//! Moderation actions and their dispatch table

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::models::UserType;

/// Roles allowed to run advertiser-stage actions
const ADVERTISER_ROLES: &[&str] = &["anunciante", "admin"];
/// Roles allowed to run admin-stage actions
const ADMIN_ROLES: &[&str] = &["admin"];

/// Moderation action requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModerationAction {
    AdvertiserApproveFirstInstance,
    AdvertiserRejectToSecondInstance,
    AdminReject,
    AdminReturnToAdvertiser,
    AdvertiserApproveSecondInstance,
    AdvertiserRejectSecondInstance,
}

impl ModerationAction {
    pub const ALL: [ModerationAction; 6] = [
        ModerationAction::AdvertiserApproveFirstInstance,
        ModerationAction::AdvertiserRejectToSecondInstance,
        ModerationAction::AdminReject,
        ModerationAction::AdminReturnToAdvertiser,
        ModerationAction::AdvertiserApproveSecondInstance,
        ModerationAction::AdvertiserRejectSecondInstance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationAction::AdvertiserApproveFirstInstance => "ADVERTISER_APPROVE_FIRST_INSTANCE",
            ModerationAction::AdvertiserRejectToSecondInstance => {
                "ADVERTISER_REJECT_TO_SECOND_INSTANCE"
            }
            ModerationAction::AdminReject => "ADMIN_REJECT",
            ModerationAction::AdminReturnToAdvertiser => "ADMIN_RETURN_TO_ADVERTISER",
            ModerationAction::AdvertiserApproveSecondInstance => {
                "ADVERTISER_APPROVE_SECOND_INSTANCE"
            }
            ModerationAction::AdvertiserRejectSecondInstance => "ADVERTISER_REJECT_SECOND_INSTANCE",
        }
    }

    /// Dispatch entry for this action
    pub fn route(&self) -> ActionRoute {
        use CallerParam::{Admin, Advertiser};
        use ModerationAction::*;

        let (required_roles, rpc_name, caller_param) = match self {
            AdvertiserApproveFirstInstance => (
                ADVERTISER_ROLES,
                "approve_submission_first_instance",
                Advertiser,
            ),
            AdvertiserRejectToSecondInstance => (
                ADVERTISER_ROLES,
                "reject_submission_to_second_instance",
                Advertiser,
            ),
            AdminReject => (ADMIN_ROLES, "admin_reject_submission", Admin),
            AdminReturnToAdvertiser => (
                ADMIN_ROLES,
                "admin_return_submission_to_advertiser",
                Admin,
            ),
            AdvertiserApproveSecondInstance => (
                ADVERTISER_ROLES,
                "approve_submission_second_instance",
                Advertiser,
            ),
            AdvertiserRejectSecondInstance => (
                ADVERTISER_ROLES,
                "reject_submission_second_instance",
                Advertiser,
            ),
        };

        ActionRoute {
            action: *self,
            required_roles,
            rpc_name,
            caller_param,
        }
    }
}

impl fmt::Display for ModerationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModerationAction::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| format!("Invalid action: {}", s))
    }
}

/// Parameter name under which the caller's id is passed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerParam {
    Advertiser,
    Admin,
}

impl CallerParam {
    pub fn name(&self) -> &'static str {
        match self {
            CallerParam::Advertiser => "p_advertiser_id",
            CallerParam::Admin => "p_admin_id",
        }
    }
}

/// One row of the dispatch table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionRoute {
    pub action: ModerationAction,
    pub required_roles: &'static [&'static str],
    pub rpc_name: &'static str,
    pub caller_param: CallerParam,
}

impl ActionRoute {
    pub fn permits(&self, user_type: &UserType) -> bool {
        self.required_roles.contains(&user_type.as_str())
    }

    /// Human readable list of the roles this route accepts
    pub fn expected_roles(&self) -> String {
        self.required_roles.join(" or ")
    }

    /// Procedure parameters for a given submission and caller
    pub fn params(&self, submission_id: &str, caller_id: &str) -> Value {
        let mut params = serde_json::Map::new();
        params.insert(
            "p_submission_id".to_string(),
            Value::String(submission_id.to_string()),
        );
        params.insert(
            self.caller_param.name().to_string(),
            Value::String(caller_id.to_string()),
        );
        Value::Object(params)
    }
}

/// Request body accepted by the gateway. Fields are optional so that missing
/// values are reported as a bad request rather than a decode failure.
#[derive(Debug, Deserialize)]
pub struct ModerationRequestBody {
    pub submission_id: Option<String>,
    pub action: Option<String>,
}

/// Validated moderation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationRequest {
    pub submission_id: String,
    pub action: ModerationAction,
}

/// Successful gateway response
#[derive(Debug, Serialize, Deserialize)]
pub struct ModerationResponse {
    pub success: bool,
    pub message: String,
    pub rpc_name: String,
    pub data: Value,
}
