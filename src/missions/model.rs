use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use validator::Validate;

use crate::models::{Mission, MissionSubmission};

/// Mission status as shown to a participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MissionDisplayStatus {
    Available,
    Pending,
    Completed,
    Rejected,
    InProgress,
    /// Backend value with no display mapping, passed through unchanged
    Other(String),
}

impl MissionDisplayStatus {
    /// Map a backend status. Portuguese mission statuses and the English
    /// display names are both recognized.
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "ativa" | "available" => MissionDisplayStatus::Available,
            "pendente" | "pending" => MissionDisplayStatus::Pending,
            "concluída" | "completed" => MissionDisplayStatus::Completed,
            "rejeitada" | "rejected" => MissionDisplayStatus::Rejected,
            "em_progresso" | "in_progress" => MissionDisplayStatus::InProgress,
            other => MissionDisplayStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MissionDisplayStatus::Available => "available",
            MissionDisplayStatus::Pending => "pending",
            MissionDisplayStatus::Completed => "completed",
            MissionDisplayStatus::Rejected => "rejected",
            MissionDisplayStatus::InProgress => "in_progress",
            MissionDisplayStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for MissionDisplayStatus {
    fn from(raw: String) -> Self {
        MissionDisplayStatus::from_raw(&raw)
    }
}

impl From<MissionDisplayStatus> for String {
    fn from(status: MissionDisplayStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for MissionDisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mission merged with the caller's submission, if any
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionView {
    pub mission: Mission,
    pub status: MissionDisplayStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<MissionSubmission>,
}

impl MissionView {
    pub fn new(mission: Mission, submission: Option<MissionSubmission>) -> Self {
        let status = match &submission {
            Some(submission) => MissionDisplayStatus::from_raw(&submission.status),
            None => MissionDisplayStatus::from_raw(&mission.status),
        };
        Self {
            mission,
            status,
            submission,
        }
    }

    pub fn raw_status(&self) -> &str {
        &self.mission.status
    }
}

/// Keep the views that match a list filter.
///
/// `all` keeps everything. `available` also keeps missions whose raw status
/// is `ativa` in any casing. Any other filter compares the display status.
pub fn filter_missions(views: Vec<MissionView>, filter: &str) -> Vec<MissionView> {
    match filter {
        "all" => views,
        "available" => views
            .into_iter()
            .filter(|view| {
                view.status == MissionDisplayStatus::Available
                    || view.raw_status().to_lowercase() == "ativa"
            })
            .collect(),
        other => views
            .into_iter()
            .filter(|view| view.status.as_str() == other)
            .collect(),
    }
}

#[derive(Debug, Deserialize)]
pub struct MissionListQuery {
    pub filter: Option<String>,
}

/// States a participant may create a submission in. Every later state is
/// reached through the moderation procedures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionEntryStatus {
    #[default]
    Pending,
    InProgress,
}

impl SubmissionEntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionEntryStatus::Pending => "pending",
            SubmissionEntryStatus::InProgress => "in_progress",
        }
    }
}

/// Participant submission body
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitMissionRequest {
    #[serde(default)]
    pub submission_data: Value,
    #[serde(default)]
    pub status: SubmissionEntryStatus,
}

/// Stored submission plus the confirmation shown to the participant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub submission: MissionSubmission,
    pub message: String,
}

/// Advertiser or admin decision on a submission
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ValidateSubmissionRequest {
    /// `aprovado` approves; any other value rejects
    #[validate(length(min = 1, message = "status is required"))]
    pub status: String,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}
