use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use validator::Validate;

use crate::error::ApiResult;
use crate::middleware::{AdminUser, AuthenticatedUser};
use crate::models::{ApiResponse, Notification};
use crate::notifications::{CreateNotificationRequest, NotificationService};

/// GET /api/notifications
pub async fn list_notifications(
    State(service): State<Arc<NotificationService>>,
    user: AuthenticatedUser,
) -> ApiResult<Json<ApiResponse<Vec<Notification>>>> {
    let notifications = service.list(&user.user_id).await?;
    Ok(Json(ApiResponse::ok(notifications)))
}

/// POST /api/notifications/:id/read
pub async fn mark_notification_read(
    State(service): State<Arc<NotificationService>>,
    user: AuthenticatedUser,
    Path(notification_id): Path<String>,
) -> ApiResult<Json<ApiResponse<Notification>>> {
    let notification = service.mark_read(&user.user_id, &notification_id).await?;
    Ok(Json(ApiResponse::ok(notification)))
}

/// POST /api/notifications/read-all
pub async fn mark_all_notifications_read(
    State(service): State<Arc<NotificationService>>,
    user: AuthenticatedUser,
) -> ApiResult<Json<ApiResponse<Value>>> {
    let updated = service.mark_all_read(&user.user_id).await?;
    Ok(Json(ApiResponse::ok(json!({ "updated": updated }))))
}

/// DELETE /api/notifications/:id
pub async fn delete_notification(
    State(service): State<Arc<NotificationService>>,
    user: AuthenticatedUser,
    Path(notification_id): Path<String>,
) -> ApiResult<StatusCode> {
    service.delete(&user.user_id, &notification_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/notifications (admin only)
pub async fn create_notification(
    State(service): State<Arc<NotificationService>>,
    AdminUser(admin): AdminUser,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<ApiResponse<Notification>>)> {
    let request: CreateNotificationRequest = serde_json::from_slice(&body)?;
    request.validate()?;

    let notification = service.create(&admin.user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(notification))))
}
