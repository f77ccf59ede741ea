//! Purchase status update function
//!
//! Target of the webhook's confirmation call. Confirming grants the
//! purchase's `total_credits` exactly once: the status change is a
//! compare-and-set on the status that was read, so a concurrent or
//! redelivered confirmation finds nothing to update and grants nothing.

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::baas::{first_row, Baas, BaasError, Query};
use crate::error::ApiError;
use crate::ledger::LedgerService;
use crate::models::{Purchase, PurchaseKind, PurchaseStatus};

use super::model::StatusUpdateOutcome;

#[derive(Error, Debug)]
pub enum PurchaseError {
    #[error("Purchase {0} not found")]
    NotFound(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Purchase {0} is already confirmed")]
    AlreadyConfirmed(String),

    #[error("Backend error: {0}")]
    Backend(#[from] BaasError),

    #[error("Failed to grant balance for purchase {purchase_id}: {source}")]
    Grant {
        purchase_id: String,
        source: BaasError,
    },
}

impl From<PurchaseError> for ApiError {
    fn from(err: PurchaseError) -> Self {
        match err {
            PurchaseError::NotFound(_) => ApiError::NotFound(err.to_string()),
            PurchaseError::InvalidStatus(_) => ApiError::BadRequest(err.to_string()),
            PurchaseError::AlreadyConfirmed(_) => ApiError::Conflict(err.to_string()),
            PurchaseError::Backend(source) => ApiError::Upstream {
                message: "Failed to update purchase".to_string(),
                details: Some(source.to_string()),
            },
            PurchaseError::Grant { source, .. } => ApiError::Upstream {
                message: "Failed to credit purchase".to_string(),
                details: Some(source.to_string()),
            },
        }
    }
}

/// Parse `new_status`; only `confirmed` and `failed` are accepted
pub fn parse_target_status(raw: &str) -> Result<PurchaseStatus, PurchaseError> {
    match raw.trim() {
        "confirmed" => Ok(PurchaseStatus::Confirmed),
        "failed" => Ok(PurchaseStatus::Failed),
        other => Err(PurchaseError::InvalidStatus(other.to_string())),
    }
}

pub struct PurchaseStatusUpdater {
    baas: Arc<dyn Baas>,
    ledger: Arc<LedgerService>,
}

impl PurchaseStatusUpdater {
    pub fn new(baas: Arc<dyn Baas>, ledger: Arc<LedgerService>) -> Self {
        Self { baas, ledger }
    }

    pub async fn update(
        &self,
        kind: PurchaseKind,
        purchase_id: &str,
        new_status: PurchaseStatus,
    ) -> Result<StatusUpdateOutcome, PurchaseError> {
        let purchase: Purchase = first_row(
            self.baas
                .select(&Query::table(kind.table()).eq("id", purchase_id).limit(1))
                .await?,
        )?
        .ok_or_else(|| PurchaseError::NotFound(purchase_id.to_string()))?;

        match new_status {
            PurchaseStatus::Confirmed => self.confirm(kind, purchase).await,
            PurchaseStatus::Failed => self.fail(kind, purchase).await,
            PurchaseStatus::Pending => Err(PurchaseError::InvalidStatus(
                PurchaseStatus::Pending.as_str().to_string(),
            )),
        }
    }

    async fn confirm(
        &self,
        kind: PurchaseKind,
        purchase: Purchase,
    ) -> Result<StatusUpdateOutcome, PurchaseError> {
        if purchase.status == PurchaseStatus::Confirmed {
            tracing::info!(purchase_id = %purchase.id, "Purchase already confirmed");
            return Ok(unchanged(purchase.id, PurchaseStatus::Confirmed));
        }

        let guarded = Query::table(kind.table())
            .eq("id", &purchase.id)
            .eq("status", purchase.status.as_str());

        let claimed = self
            .baas
            .update(
                &guarded,
                json!({
                    "status": PurchaseStatus::Confirmed.as_str(),
                    "confirmed_at": Utc::now().to_rfc3339(),
                }),
            )
            .await?;

        if claimed.is_empty() {
            tracing::info!(
                purchase_id = %purchase.id,
                "Purchase changed concurrently; skipping grant"
            );
            return Ok(unchanged(purchase.id, PurchaseStatus::Confirmed));
        }

        if let Err(source) = self
            .ledger
            .grant_credits(&purchase.user_id, purchase.total_credits, kind)
            .await
        {
            tracing::error!(
                purchase_id = %purchase.id,
                user_id = %purchase.user_id,
                error = %source,
                "Balance grant failed; restoring purchase status"
            );
            let restore = Query::table(kind.table()).eq("id", &purchase.id);
            if let Err(e) = self
                .baas
                .update(
                    &restore,
                    json!({ "status": purchase.status.as_str(), "confirmed_at": null }),
                )
                .await
            {
                tracing::error!(purchase_id = %purchase.id, error = %e, "Failed to restore purchase status");
            }
            return Err(PurchaseError::Grant {
                purchase_id: purchase.id,
                source,
            });
        }

        tracing::info!(
            purchase_id = %purchase.id,
            user_id = %purchase.user_id,
            credited = purchase.total_credits,
            "Purchase confirmed"
        );

        Ok(StatusUpdateOutcome {
            purchase_id: purchase.id,
            status: PurchaseStatus::Confirmed,
            credited: purchase.total_credits,
            changed: true,
        })
    }

    async fn fail(
        &self,
        kind: PurchaseKind,
        purchase: Purchase,
    ) -> Result<StatusUpdateOutcome, PurchaseError> {
        match purchase.status {
            PurchaseStatus::Confirmed => Err(PurchaseError::AlreadyConfirmed(purchase.id)),
            PurchaseStatus::Failed => Ok(unchanged(purchase.id, PurchaseStatus::Failed)),
            PurchaseStatus::Pending => {
                let failed = self
                    .baas
                    .update(
                        &Query::table(kind.table())
                            .eq("id", &purchase.id)
                            .eq("status", PurchaseStatus::Pending.as_str()),
                        json!({ "status": PurchaseStatus::Failed.as_str() }),
                    )
                    .await?;

                if failed.is_empty() {
                    tracing::info!(
                        purchase_id = %purchase.id,
                        "Purchase changed concurrently; re-reading status"
                    );
                    let current: Purchase = first_row(
                        self.baas
                            .select(&Query::table(kind.table()).eq("id", &purchase.id).limit(1))
                            .await?,
                    )?
                    .ok_or_else(|| PurchaseError::NotFound(purchase.id.clone()))?;
                    return match current.status {
                        PurchaseStatus::Confirmed => {
                            Err(PurchaseError::AlreadyConfirmed(current.id))
                        }
                        status => Ok(unchanged(current.id, status)),
                    };
                }

                tracing::info!(purchase_id = %purchase.id, "Purchase marked as failed");

                Ok(StatusUpdateOutcome {
                    purchase_id: purchase.id,
                    status: PurchaseStatus::Failed,
                    credited: 0,
                    changed: true,
                })
            }
        }
    }
}

fn unchanged(purchase_id: String, status: PurchaseStatus) -> StatusUpdateOutcome {
    StatusUpdateOutcome {
        purchase_id,
        status,
        credited: 0,
        changed: false,
    }
}
