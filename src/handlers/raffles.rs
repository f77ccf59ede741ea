use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::error::ApiResult;
use crate::middleware::{AdminUser, AuthenticatedUser};
use crate::models::{ApiResponse, Raffle};
use crate::raffles::{RaffleListQuery, RaffleService};

/// GET /api/raffles?status=active
pub async fn list_raffles(
    State(service): State<Arc<RaffleService>>,
    _user: AuthenticatedUser,
    Query(query): Query<RaffleListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Raffle>>>> {
    let raffles = service.list(query.status).await?;
    Ok(Json(ApiResponse::ok(raffles)))
}

/// POST /api/admin/raffles/:id/draw
pub async fn draw_raffle(
    State(service): State<Arc<RaffleService>>,
    AdminUser(admin): AdminUser,
    Path(raffle_id): Path<String>,
) -> ApiResult<Json<ApiResponse<Value>>> {
    let result = service.draw_winner(&raffle_id, &admin.user.user_id).await?;
    Ok(Json(ApiResponse::with_message(result, "Winner selected")))
}
