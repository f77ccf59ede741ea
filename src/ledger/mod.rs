//! Balance grants
//!
//! Credits, rifas and points are only ever changed by stored procedures that
//! lock the profile row. This module names those procedures and their
//! parameters.

use serde_json::{json, Value};
use std::sync::Arc;

use crate::baas::{Baas, BaasError};
use crate::models::PurchaseKind;

pub const INCREMENT_USER_CREDITS: &str = "increment_user_credits";
pub const ADD_POINTS_TO_USER: &str = "add_points_to_user";

pub struct LedgerService {
    baas: Arc<dyn Baas>,
}

impl LedgerService {
    pub fn new(baas: Arc<dyn Baas>) -> Self {
        Self { baas }
    }

    /// Add `amount` to the balance that a purchase of `kind` pays for
    pub async fn grant_credits(
        &self,
        user_id: &str,
        amount: i64,
        kind: PurchaseKind,
    ) -> Result<Value, BaasError> {
        tracing::info!(user_id = %user_id, amount, balance = kind.balance(), "Granting credits");

        self.baas
            .rpc(
                INCREMENT_USER_CREDITS,
                json!({
                    "p_user_id": user_id,
                    "p_amount": amount,
                    "p_credit_type": kind.balance(),
                }),
            )
            .await
    }

    pub async fn grant_points(&self, user_id: &str, points: i64) -> Result<Value, BaasError> {
        tracing::info!(user_id = %user_id, points, "Granting points");

        self.baas
            .rpc(
                ADD_POINTS_TO_USER,
                json!({ "p_user_id": user_id, "p_points": points }),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baas::MemoryBaas;

    #[tokio::test]
    async fn test_grants_call_named_procedures() {
        let baas = Arc::new(MemoryBaas::new());
        let ledger = LedgerService::new(baas.clone());

        ledger.grant_credits("u1", 120, PurchaseKind::Rifa).await.unwrap();
        ledger.grant_points("u1", 30).await.unwrap();

        let calls = baas.rpc_calls();
        assert_eq!(calls[0].name, "increment_user_credits");
        assert_eq!(
            calls[0].params,
            json!({ "p_user_id": "u1", "p_amount": 120, "p_credit_type": "rifas" })
        );
        assert_eq!(calls[1].name, "add_points_to_user");
        assert_eq!(calls[1].params["p_points"], 30);
    }
}
