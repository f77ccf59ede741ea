//! Admin balance grants

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::ledger::LedgerService;
use crate::middleware::AdminUser;
use crate::models::{ApiResponse, PurchaseKind};

#[derive(Debug, Deserialize, Validate)]
pub struct GrantCreditsRequest {
    #[validate(range(min = 1, max = 1_000_000))]
    pub amount: i64,
    /// Balance to credit; defaults to `credit`
    #[serde(default)]
    pub kind: Option<PurchaseKind>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GrantPointsRequest {
    #[validate(range(min = 1, max = 1_000_000))]
    pub points: i64,
}

fn grant_failed(err: crate::baas::BaasError) -> ApiError {
    ApiError::Upstream {
        message: "Failed to update balance".to_string(),
        details: Some(err.to_string()),
    }
}

/// POST /api/admin/users/:id/credits
pub async fn grant_credits(
    State(ledger): State<Arc<LedgerService>>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<ApiResponse<Value>>> {
    let request: GrantCreditsRequest = serde_json::from_slice(&body)?;
    request.validate()?;

    let kind = request.kind.unwrap_or(PurchaseKind::Credit);
    tracing::info!(
        admin_id = %admin.user.user_id,
        user_id = %user_id,
        amount = request.amount,
        "Admin credit grant"
    );

    let result = ledger
        .grant_credits(&user_id, request.amount, kind)
        .await
        .map_err(grant_failed)?;

    Ok(Json(ApiResponse::with_message(
        result,
        format!("{} {} granted", request.amount, kind.balance()),
    )))
}

/// POST /api/admin/users/:id/points
pub async fn grant_points(
    State(ledger): State<Arc<LedgerService>>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<ApiResponse<Value>>> {
    let request: GrantPointsRequest = serde_json::from_slice(&body)?;
    request.validate()?;

    tracing::info!(
        admin_id = %admin.user.user_id,
        user_id = %user_id,
        points = request.points,
        "Admin points grant"
    );

    let result = ledger
        .grant_points(&user_id, request.points)
        .await
        .map_err(grant_failed)?;

    Ok(Json(ApiResponse::with_message(
        result,
        format!("{} points granted", request.points),
    )))
}
