//! Raffles
//!
//! Listing and the admin winner draw. The draw itself happens in the
//! `select_raffle_winner` procedure.

use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

use crate::baas::{decode_rows, first_row, Baas, BaasError, Direction, Query};
use crate::error::ApiError;
use crate::models::{Raffle, RaffleStatus};

pub const SELECT_RAFFLE_WINNER: &str = "select_raffle_winner";

#[derive(Error, Debug)]
pub enum RaffleError {
    #[error("Raffle {0} not found")]
    NotFound(String),

    #[error("Raffle {id} cannot be drawn while {status:?}")]
    NotDrawable { id: String, status: RaffleStatus },

    #[error("Backend error: {0}")]
    Backend(#[from] BaasError),

    #[error("Winner draw failed: {source}")]
    Draw { rpc_params: Value, source: BaasError },
}

impl From<RaffleError> for ApiError {
    fn from(err: RaffleError) -> Self {
        match err {
            RaffleError::NotFound(_) => ApiError::NotFound(err.to_string()),
            RaffleError::NotDrawable { .. } => ApiError::Conflict(err.to_string()),
            RaffleError::Backend(source) => ApiError::Upstream {
                message: "Failed to load raffles".to_string(),
                details: Some(source.to_string()),
            },
            RaffleError::Draw { rpc_params, source } => ApiError::RpcFailed {
                rpc_name: SELECT_RAFFLE_WINNER.to_string(),
                rpc_params,
                details: source.to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RaffleListQuery {
    pub status: Option<RaffleStatus>,
}

pub struct RaffleService {
    baas: Arc<dyn Baas>,
}

impl RaffleService {
    pub fn new(baas: Arc<dyn Baas>) -> Self {
        Self { baas }
    }

    /// Raffles ordered by draw date, optionally restricted to one status
    pub async fn list(&self, status: Option<RaffleStatus>) -> Result<Vec<Raffle>, RaffleError> {
        let mut query = Query::table("raffles").order("draw_date", Direction::Asc);
        if let Some(status) = status {
            query = query.eq("status", raffle_status_name(status));
        }
        Ok(decode_rows(self.baas.select(&query).await?)?)
    }

    pub async fn draw_winner(&self, raffle_id: &str, admin_id: &str) -> Result<Value, RaffleError> {
        let raffle: Raffle = first_row(
            self.baas
                .select(&Query::table("raffles").eq("id", raffle_id).limit(1))
                .await?,
        )?
        .ok_or_else(|| RaffleError::NotFound(raffle_id.to_string()))?;

        if matches!(raffle.status, RaffleStatus::Canceled | RaffleStatus::Draft) {
            return Err(RaffleError::NotDrawable {
                id: raffle.id,
                status: raffle.status,
            });
        }

        let params = json!({ "p_raffle_id": raffle_id });
        tracing::info!(raffle_id = %raffle_id, admin_id = %admin_id, "Drawing raffle winner");

        self.baas
            .rpc(SELECT_RAFFLE_WINNER, params.clone())
            .await
            .map_err(|source| {
                tracing::error!(raffle_id = %raffle_id, error = %source, "Winner draw failed");
                RaffleError::Draw {
                    rpc_params: params,
                    source,
                }
            })
    }
}

fn raffle_status_name(status: RaffleStatus) -> &'static str {
    match status {
        RaffleStatus::Active => "active",
        RaffleStatus::Pending => "pending",
        RaffleStatus::Completed => "completed",
        RaffleStatus::Canceled => "canceled",
        RaffleStatus::Draft => "draft",
        RaffleStatus::Finished => "finished",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baas::MemoryBaas;

    fn service() -> (Arc<MemoryBaas>, RaffleService) {
        let baas = Arc::new(MemoryBaas::new());
        for (id, status, draw_date) in [
            ("r1", "active", "2024-06-01T00:00:00Z"),
            ("r2", "draft", "2024-05-01T00:00:00Z"),
            ("r3", "canceled", "2024-07-01T00:00:00Z"),
        ] {
            baas.seed(
                "raffles",
                json!({ "id": id, "title": id, "status": status, "draw_date": draw_date }),
            );
        }
        (baas.clone(), RaffleService::new(baas))
    }

    #[tokio::test]
    async fn test_list_by_status() {
        let (_, service) = service();
        let all = service.list(None).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r2", "r1", "r3"]);

        let active = service.list(Some(RaffleStatus::Active)).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "r1");
    }

    #[tokio::test]
    async fn test_draw_winner() {
        let (baas, service) = service();
        baas.respond_with(SELECT_RAFFLE_WINNER, json!({ "winner_user_id": "u9" }));

        let result = service.draw_winner("r1", "admin-1").await.unwrap();
        assert_eq!(result["winner_user_id"], "u9");
        assert_eq!(baas.rpc_calls()[0].params, json!({ "p_raffle_id": "r1" }));
    }

    #[tokio::test]
    async fn test_draw_refuses_draft_canceled_and_missing() {
        let (baas, service) = service();
        assert!(matches!(
            service.draw_winner("r2", "admin-1").await,
            Err(RaffleError::NotDrawable { .. })
        ));
        assert!(matches!(
            service.draw_winner("r3", "admin-1").await,
            Err(RaffleError::NotDrawable { .. })
        ));
        assert!(matches!(
            service.draw_winner("nope", "admin-1").await,
            Err(RaffleError::NotFound(_))
        ));
        assert!(baas.rpc_calls().is_empty());
    }
}
