//! Payment reconciliation webhook
//!
//! Mercado Pago notifications carry only a payment id. The payment itself is
//! fetched from the provider, matched to a local purchase through its
//! `external_reference`, and the purchase is settled according to the
//! provider's status. Confirmation is delegated to the purchase status
//! function so that the balance grant happens in one place.

use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::baas::{first_row, Baas, BaasError, Query};
use crate::config::SignaturePolicy;
use crate::error::ApiError;
use crate::models::{Purchase, PurchaseKind, PurchaseStatus};

use super::mercado_pago::{verify_signature, PaymentProvider, ProviderError};
use super::model::{PaymentDecision, WebhookNotification, WebhookOutcome};

/// Webhook errors
#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("Payment provider is not configured")]
    NotConfigured,

    #[error("Webhook secret is not configured")]
    MissingSecret,

    #[error("Missing x-signature header")]
    MissingSignature,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid JSON body: {0}")]
    InvalidBody(String),

    #[error("Notification has no payment id")]
    MissingPaymentId,

    #[error("Failed to fetch payment {payment_id}: {source}")]
    Provider {
        payment_id: String,
        source: ProviderError,
    },

    #[error("Payment {0} has no external_reference")]
    MissingExternalReference(String),

    #[error("Purchase {0} not found")]
    PurchaseNotFound(String),

    #[error("Backend error: {0}")]
    Backend(#[from] BaasError),

    #[error("Status update function {function} failed: {source}")]
    StatusUpdate {
        function: &'static str,
        source: BaasError,
    },
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::NotConfigured => ApiError::Configuration(err.to_string()),
            WebhookError::MissingSecret => ApiError::ServiceUnavailable(err.to_string()),
            WebhookError::MissingSignature | WebhookError::InvalidSignature => {
                ApiError::Unauthorized(err.to_string())
            }
            WebhookError::InvalidBody(_)
            | WebhookError::MissingPaymentId
            | WebhookError::MissingExternalReference(_) => ApiError::BadRequest(err.to_string()),
            WebhookError::PurchaseNotFound(_) => ApiError::NotFound(err.to_string()),
            WebhookError::Provider { source, .. } => ApiError::Upstream {
                message: "Failed to fetch payment from provider".to_string(),
                details: Some(source.to_string()),
            },
            WebhookError::Backend(source) => ApiError::Upstream {
                message: "Failed to update purchase".to_string(),
                details: Some(source.to_string()),
            },
            WebhookError::StatusUpdate { function, source } => {
                let details = match source {
                    BaasError::Function { body, .. } => body,
                    other => other.to_string(),
                };
                ApiError::Upstream {
                    message: format!("Failed to invoke {}", function),
                    details: Some(details),
                }
            }
        }
    }
}

/// Settles purchases from provider notifications
pub struct PaymentReconciler {
    baas: Arc<dyn Baas>,
    provider: Option<Arc<dyn PaymentProvider>>,
    webhook_secret: Option<String>,
    policy: SignaturePolicy,
}

impl PaymentReconciler {
    pub fn new(
        baas: Arc<dyn Baas>,
        provider: Option<Arc<dyn PaymentProvider>>,
        webhook_secret: Option<String>,
        policy: SignaturePolicy,
    ) -> Self {
        Self {
            baas,
            provider,
            webhook_secret,
            policy,
        }
    }

    /// Process one notification for purchases of `kind`.
    ///
    /// `body` must be the raw request body; the signature covers its exact
    /// bytes.
    pub async fn handle_notification(
        &self,
        kind: PurchaseKind,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<WebhookOutcome, WebhookError> {
        let provider = self.provider.as_ref().ok_or_else(|| {
            tracing::error!("MERCADO_PAGO_ACCESS_TOKEN is not set");
            WebhookError::NotConfigured
        })?;

        self.check_signature(signature, body)?;

        let notification: WebhookNotification =
            serde_json::from_slice(body).map_err(|e| WebhookError::InvalidBody(e.to_string()))?;

        if !notification.is_payment() {
            tracing::info!(
                notification_type = ?notification.notification_type,
                "Ignoring non-payment notification"
            );
            return Ok(WebhookOutcome::Ignored {
                notification_type: notification.notification_type,
            });
        }

        let payment_id = notification
            .payment_id()
            .ok_or(WebhookError::MissingPaymentId)?
            .to_string();

        let payment = provider
            .fetch_payment(&payment_id)
            .await
            .map_err(|source| {
                tracing::error!(payment_id = %payment_id, error = %source, "Failed to fetch payment");
                WebhookError::Provider {
                    payment_id: payment_id.clone(),
                    source,
                }
            })?;

        let purchase_id = payment
            .external_reference
            .clone()
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| WebhookError::MissingExternalReference(payment.id.clone()))?;

        tracing::info!(
            payment_id = %payment.id,
            purchase_id = %purchase_id,
            payment_status = %payment.status,
            kind = ?kind,
            "Reconciling payment"
        );

        let purchase_query = Query::table(kind.table()).eq("id", &purchase_id);
        let purchase: Purchase = first_row(self.baas.select(&purchase_query.clone().limit(1)).await?)?
            .ok_or_else(|| WebhookError::PurchaseNotFound(purchase_id.clone()))?;

        if purchase.payment_id.as_deref() != Some(payment.id.as_str()) {
            tracing::info!(
                purchase_id = %purchase_id,
                previous = ?purchase.payment_id,
                payment_id = %payment.id,
                "Updating stored payment id"
            );
            self.baas
                .update(&purchase_query, json!({ "payment_id": payment.id }))
                .await?;
        }

        match PaymentDecision::from_provider_status(&payment.status) {
            PaymentDecision::Confirm => {
                let function = kind.status_function();
                self.baas
                    .invoke_function(
                        function,
                        json!({
                            "purchase_id": purchase_id,
                            "new_status": PurchaseStatus::Confirmed.as_str(),
                        }),
                    )
                    .await
                    .map_err(|source| {
                        tracing::error!(
                            function,
                            purchase_id = %purchase_id,
                            error = %source,
                            "Status update function failed"
                        );
                        WebhookError::StatusUpdate { function, source }
                    })?;

                Ok(WebhookOutcome::Confirmed {
                    purchase_id,
                    payment_id: payment.id,
                })
            }
            PaymentDecision::Fail => {
                let pending = purchase_query.eq("status", PurchaseStatus::Pending.as_str());
                let failed = self
                    .baas
                    .update(&pending, json!({ "status": PurchaseStatus::Failed.as_str() }))
                    .await?;

                if failed.is_empty() && purchase.status != PurchaseStatus::Failed {
                    tracing::warn!(
                        purchase_id = %purchase_id,
                        current = %purchase.status.as_str(),
                        payment_status = %payment.status,
                        "Purchase no longer pending; failure not applied"
                    );
                    return Ok(WebhookOutcome::Unchanged {
                        purchase_id,
                        payment_id: payment.id,
                        payment_status: payment.status,
                    });
                }
                tracing::info!(purchase_id = %purchase_id, "Purchase marked as failed");

                Ok(WebhookOutcome::Failed {
                    purchase_id,
                    payment_id: payment.id,
                })
            }
            PaymentDecision::Leave => Ok(WebhookOutcome::Unchanged {
                purchase_id,
                payment_id: payment.id,
                payment_status: payment.status,
            }),
        }
    }

    fn check_signature(&self, signature: Option<&str>, body: &[u8]) -> Result<(), WebhookError> {
        let signature = signature.map(str::trim).filter(|s| !s.is_empty());

        match (self.webhook_secret.as_deref(), signature) {
            (Some(secret), Some(header)) => {
                if verify_signature(secret, body, header) {
                    Ok(())
                } else {
                    tracing::warn!("Webhook signature mismatch");
                    Err(WebhookError::InvalidSignature)
                }
            }
            (None, _) if self.policy == SignaturePolicy::Strict => {
                tracing::error!("Webhook secret missing under strict signature policy");
                Err(WebhookError::MissingSecret)
            }
            (Some(_), None) if self.policy == SignaturePolicy::Strict => {
                tracing::warn!("Webhook delivered without signature");
                Err(WebhookError::MissingSignature)
            }
            (None, _) => {
                tracing::warn!("Webhook secret not configured; skipping signature check");
                Ok(())
            }
            (Some(_), None) => {
                tracing::warn!("Webhook delivered without signature; accepting under lenient policy");
                Ok(())
            }
        }
    }
}
