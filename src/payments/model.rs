use serde::{Deserialize, Serialize};
use validator::Validate;

use super::mercado_pago::string_or_number;
use crate::models::PurchaseStatus;

/// Notification type that refers to a payment
pub const PAYMENT_NOTIFICATION: &str = "payment";

/// Body Mercado Pago posts to the webhook
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookNotification {
    #[serde(rename = "type", default)]
    pub notification_type: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub data: Option<NotificationData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationData {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

impl WebhookNotification {
    pub fn is_payment(&self) -> bool {
        self.notification_type.as_deref() == Some(PAYMENT_NOTIFICATION)
    }

    pub fn payment_id(&self) -> Option<&str> {
        self.data
            .as_ref()
            .map(|data| data.id.trim())
            .filter(|id| !id.is_empty())
    }
}

/// What the provider's payment status means for the local purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentDecision {
    Confirm,
    Fail,
    Leave,
}

impl PaymentDecision {
    pub fn from_provider_status(status: &str) -> Self {
        match status {
            "approved" => PaymentDecision::Confirm,
            "rejected" | "cancelled" => PaymentDecision::Fail,
            _ => PaymentDecision::Leave,
        }
    }
}

/// Result of processing one webhook delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Not a payment notification
    Ignored { notification_type: Option<String> },
    /// Status function invoked with `confirmed`
    Confirmed { purchase_id: String, payment_id: String },
    /// Purchase marked `failed`
    Failed { purchase_id: String, payment_id: String },
    /// Provider status requires no change (pending, in_process, ...)
    Unchanged {
        purchase_id: String,
        payment_id: String,
        payment_status: String,
    },
}

/// JSON acknowledgement returned to the provider
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<String>,
}

impl From<WebhookOutcome> for WebhookResponse {
    fn from(outcome: WebhookOutcome) -> Self {
        match outcome {
            WebhookOutcome::Ignored { notification_type } => WebhookResponse {
                success: true,
                message: format!(
                    "Notification type {} ignored",
                    notification_type.as_deref().unwrap_or("unknown")
                ),
                purchase_id: None,
                payment_status: None,
            },
            WebhookOutcome::Confirmed { purchase_id, .. } => WebhookResponse {
                success: true,
                message: "Purchase confirmed".to_string(),
                purchase_id: Some(purchase_id),
                payment_status: Some("approved".to_string()),
            },
            WebhookOutcome::Failed { purchase_id, .. } => WebhookResponse {
                success: true,
                message: "Purchase marked as failed".to_string(),
                purchase_id: Some(purchase_id),
                payment_status: Some(PurchaseStatus::Failed.as_str().to_string()),
            },
            WebhookOutcome::Unchanged {
                purchase_id,
                payment_status,
                ..
            } => WebhookResponse {
                success: true,
                message: "Payment status requires no change".to_string(),
                purchase_id: Some(purchase_id),
                payment_status: Some(payment_status),
            },
        }
    }
}

/// Body of the purchase status update function
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdatePurchaseStatusRequest {
    #[validate(length(min = 1, message = "purchase_id is required"))]
    pub purchase_id: String,
    #[validate(length(min = 1, message = "new_status is required"))]
    pub new_status: String,
}

/// Result of a status update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdateOutcome {
    pub purchase_id: String,
    pub status: PurchaseStatus,
    /// Balance granted by this call; zero when nothing changed
    pub credited: i64,
    pub changed: bool,
}
