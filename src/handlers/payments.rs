//! Payment webhook and purchase status handlers

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use validator::Validate;

use crate::error::ApiResult;
use crate::middleware::ServiceRoleCaller;
use crate::models::{ApiResponse, PurchaseKind};
use crate::payments::{
    parse_target_status, StatusUpdateOutcome, UpdatePurchaseStatusRequest, WebhookResponse,
};
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "x-signature";

async fn handle_webhook(
    app_state: AppState,
    kind: PurchaseKind,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookResponse>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let outcome = app_state
        .payment_reconciler
        .handle_notification(kind, signature, &body)
        .await?;

    Ok(Json(outcome.into()))
}

/// POST /functions/v1/mercadopago-webhook
pub async fn mercadopago_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookResponse>> {
    handle_webhook(app_state, PurchaseKind::Credit, headers, body).await
}

/// POST /functions/v1/mercadopago-rifa-webhook
pub async fn mercadopago_rifa_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookResponse>> {
    handle_webhook(app_state, PurchaseKind::Rifa, headers, body).await
}

async fn update_status(
    app_state: AppState,
    kind: PurchaseKind,
    body: Bytes,
) -> ApiResult<Json<ApiResponse<StatusUpdateOutcome>>> {
    let request: UpdatePurchaseStatusRequest = serde_json::from_slice(&body)?;
    request.validate()?;

    let new_status = parse_target_status(&request.new_status)?;
    let outcome = app_state
        .purchase_status
        .update(kind, request.purchase_id.trim(), new_status)
        .await?;

    Ok(Json(ApiResponse::ok(outcome)))
}

/// POST /functions/v1/update-credit-purchase-status
pub async fn update_credit_purchase_status(
    State(app_state): State<AppState>,
    _caller: ServiceRoleCaller,
    body: Bytes,
) -> ApiResult<Json<ApiResponse<StatusUpdateOutcome>>> {
    update_status(app_state, PurchaseKind::Credit, body).await
}

/// POST /functions/v1/update-rifa-purchase-status
pub async fn update_rifa_purchase_status(
    State(app_state): State<AppState>,
    _caller: ServiceRoleCaller,
    body: Bytes,
) -> ApiResult<Json<ApiResponse<StatusUpdateOutcome>>> {
    update_status(app_state, PurchaseKind::Rifa, body).await
}
