//! Submission moderation handler

use axum::{body::Bytes, extract::State, Json};

use crate::error::ApiResult;
use crate::middleware::AuthenticatedUser;
use crate::moderation::{parse_request, ModerationResponse};
use crate::state::AppState;

/// POST /functions/v1/moderate-submission
///
/// The body is parsed after the caller is authenticated so that a missing
/// bearer is reported before a malformed body.
pub async fn moderate_submission(
    State(app_state): State<AppState>,
    caller: AuthenticatedUser,
    body: Bytes,
) -> ApiResult<Json<ModerationResponse>> {
    let request = parse_request(&body)?;

    let response = app_state
        .moderation_gateway
        .dispatch(&caller.user_id, &request)
        .await?;

    Ok(Json(response))
}
