//! Mission listing, submission and validation

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::baas::{decode_rows, first_row, Baas, BaasError, Query};
use crate::error::ApiError;
use crate::models::{Mission, MissionSubmission};

use super::model::{MissionView, SubmissionEntryStatus, SubmissionReceipt};

pub const FINALIZE_SUBMISSION: &str = "finalize_submission";
const APPROVED: &str = "aprovado";

/// Mission service errors. Each carries a message suitable for participants.
#[derive(Error, Debug)]
pub enum MissionError {
    #[error("Mission {0} not found")]
    MissionNotFound(String),

    #[error("Mission {0} is closed")]
    MissionClosed(String),

    #[error("Mission {mission_id} already submitted by {user_id}")]
    AlreadySubmitted { user_id: String, mission_id: String },

    #[error("Failed to load missions: {0}")]
    Load(BaasError),

    #[error("Failed to submit mission: {0}")]
    Submit(BaasError),

    #[error("Failed to finalize submission {submission_id}: {source}")]
    Finalize {
        submission_id: String,
        rpc_params: Value,
        source: BaasError,
    },
}

impl MissionError {
    /// Message shown to the participant
    pub fn user_message(&self) -> &'static str {
        match self {
            MissionError::MissionNotFound(_) => "Missão não encontrada.",
            MissionError::MissionClosed(_) => "Esta missão não está mais disponível.",
            MissionError::AlreadySubmitted { .. } => "Você já enviou esta missão.",
            MissionError::Load(_) => "Não foi possível carregar as missões. Tente novamente.",
            MissionError::Submit(_) => "Erro ao enviar a missão. Tente novamente.",
            MissionError::Finalize { .. } => "Erro ao validar a submissão. Tente novamente.",
        }
    }
}

impl From<MissionError> for ApiError {
    fn from(err: MissionError) -> Self {
        let message = err.user_message().to_string();
        match err {
            MissionError::MissionNotFound(_) => ApiError::NotFound(message),
            MissionError::MissionClosed(_) | MissionError::AlreadySubmitted { .. } => {
                ApiError::Conflict(message)
            }
            MissionError::Load(source) | MissionError::Submit(source) => ApiError::Upstream {
                message,
                details: Some(source.to_string()),
            },
            MissionError::Finalize {
                rpc_params, source, ..
            } => ApiError::RpcFailed {
                rpc_name: FINALIZE_SUBMISSION.to_string(),
                rpc_params,
                details: source.to_string(),
            },
        }
    }
}

pub struct MissionService {
    baas: Arc<dyn Baas>,
}

impl MissionService {
    pub fn new(baas: Arc<dyn Baas>) -> Self {
        Self { baas }
    }

    /// Active missions merged with the caller's submissions
    pub async fn fetch_missions(&self, user_id: &str) -> Result<Vec<MissionView>, MissionError> {
        let missions_query = Query::table("missions").eq("is_active", true);
        let submissions_query = Query::table("mission_submissions").eq("user_id", user_id);

        let (mission_rows, submission_rows) = tokio::try_join!(
            self.baas.select(&missions_query),
            self.baas.select(&submissions_query),
        )
        .map_err(|e| {
            tracing::error!(user_id = %user_id, error = %e, "Failed to load missions");
            MissionError::Load(e)
        })?;

        let missions: Vec<Mission> = decode_rows(mission_rows).map_err(MissionError::Load)?;
        let submissions: Vec<MissionSubmission> =
            decode_rows(submission_rows).map_err(MissionError::Load)?;

        let mut by_mission: HashMap<String, MissionSubmission> = HashMap::new();
        for submission in submissions {
            by_mission.insert(submission.mission_id.clone(), submission);
        }

        let views: Vec<MissionView> = missions
            .into_iter()
            .map(|mission| {
                let submission = by_mission.remove(&mission.id);
                MissionView::new(mission, submission)
            })
            .collect();

        tracing::debug!(user_id = %user_id, count = views.len(), "Missions loaded");
        Ok(views)
    }

    /// Record a participant's submission.
    ///
    /// Relies on the unique (user_id, mission_id) constraint of
    /// `mission_submissions` to reject duplicates.
    pub async fn submit_mission(
        &self,
        user_id: &str,
        mission_id: &str,
        submission_data: Value,
        status: SubmissionEntryStatus,
    ) -> Result<SubmissionReceipt, MissionError> {
        let mission: Mission = first_row(
            self.baas
                .select(&Query::table("missions").eq("id", mission_id).limit(1))
                .await
                .map_err(MissionError::Submit)?,
        )
        .map_err(MissionError::Submit)?
        .ok_or_else(|| MissionError::MissionNotFound(mission_id.to_string()))?;

        if !mission.is_active {
            tracing::info!(user_id = %user_id, mission_id = %mission_id, "Submission to inactive mission refused");
            return Err(MissionError::MissionClosed(mission_id.to_string()));
        }

        let row = json!({
            "user_id": user_id,
            "mission_id": mission_id,
            "submission_data": submission_data,
            "status": status.as_str(),
            "review_stage": "advertiser_first",
        });

        let stored = match self.baas.insert("mission_submissions", row).await {
            Ok(stored) => stored,
            Err(BaasError::UniqueViolation(_)) => {
                tracing::info!(user_id = %user_id, mission_id = %mission_id, "Duplicate submission rejected");
                return Err(MissionError::AlreadySubmitted {
                    user_id: user_id.to_string(),
                    mission_id: mission_id.to_string(),
                });
            }
            Err(e) => {
                tracing::error!(user_id = %user_id, mission_id = %mission_id, error = %e, "Failed to insert submission");
                return Err(MissionError::Submit(e));
            }
        };

        let submission: MissionSubmission =
            serde_json::from_value(stored).map_err(|e| MissionError::Submit(e.into()))?;

        tracing::info!(
            submission_id = %submission.id,
            user_id = %user_id,
            mission_id = %mission_id,
            "Mission submitted"
        );

        Ok(SubmissionReceipt {
            submission,
            message: confirmation_message(&mission),
        })
    }

    /// Finalize a submission through `finalize_submission`
    pub async fn validate_submission(
        &self,
        submission_id: &str,
        approver_id: &str,
        status: &str,
        is_admin: bool,
        notes: Option<&str>,
    ) -> Result<Value, MissionError> {
        let params = json!({
            "p_submission_id": submission_id,
            "p_approver_id": approver_id,
            "p_is_approved": status == APPROVED,
            "p_stage": if is_admin { "admin" } else { "advertiser_first" },
            "p_notes": notes,
        });

        tracing::info!(
            submission_id = %submission_id,
            approver_id = %approver_id,
            approved = status == APPROVED,
            "Finalizing submission"
        );

        self.baas
            .rpc(FINALIZE_SUBMISSION, params.clone())
            .await
            .map_err(|source| {
                tracing::error!(submission_id = %submission_id, error = %source, "finalize_submission failed");
                MissionError::Finalize {
                    submission_id: submission_id.to_string(),
                    rpc_params: params,
                    source,
                }
            })
    }
}

fn confirmation_message(mission: &Mission) -> String {
    let mut rewards = vec![format!("{} pontos", mission.points)];
    if mission.rifas > 0 {
        rewards.push(format!("{} rifas", mission.rifas));
    }
    format!(
        "Missão \"{}\" enviada! Você receberá {} após a aprovação.",
        mission.title,
        rewards.join(" e ")
    )
}
