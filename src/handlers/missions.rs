//! Mission handlers

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::middleware::{AuthenticatedUser, ProfileUser};
use crate::missions::{
    filter_missions, MissionListQuery, MissionService, MissionView, SubmitMissionRequest,
    ValidateSubmissionRequest,
};
use crate::models::{ApiResponse, MissionSubmission, UserType};

/// GET /api/missions?filter=available
pub async fn list_missions(
    State(service): State<Arc<MissionService>>,
    user: AuthenticatedUser,
    Query(query): Query<MissionListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<MissionView>>>> {
    let views = service.fetch_missions(&user.user_id).await?;
    let filter = query.filter.as_deref().unwrap_or("all");

    Ok(Json(ApiResponse::ok(filter_missions(views, filter))))
}

/// POST /api/missions/:id/submissions
pub async fn submit_mission(
    State(service): State<Arc<MissionService>>,
    user: AuthenticatedUser,
    Path(mission_id): Path<String>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<ApiResponse<MissionSubmission>>)> {
    let request: SubmitMissionRequest = serde_json::from_slice(&body)?;

    let receipt = service
        .submit_mission(
            &user.user_id,
            &mission_id,
            request.submission_data,
            request.status,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(receipt.submission, receipt.message)),
    ))
}

/// POST /api/submissions/:id/validate
pub async fn validate_submission(
    State(service): State<Arc<MissionService>>,
    caller: ProfileUser,
    Path(submission_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<ApiResponse<Value>>> {
    let user_type = &caller.profile.user_type;
    if !matches!(user_type, UserType::Advertiser | UserType::Admin) {
        return Err(ApiError::Forbidden(format!(
            "Role {} cannot validate submissions",
            user_type
        )));
    }

    let request: ValidateSubmissionRequest = serde_json::from_slice(&body)?;
    request.validate()?;

    let result = service
        .validate_submission(
            &submission_id,
            &caller.user.user_id,
            &request.status,
            user_type.is_admin(),
            request.notes.as_deref(),
        )
        .await?;

    Ok(Json(ApiResponse::ok(result)))
}
