//! Data models for PremiAds
//!
//! These mirror rows owned by the hosted database. Unknown enum values coming
//! from the backend are kept rather than rejected, since the database is the
//! source of truth for its own vocabularies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Standard success envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        }
    }
}

// ============================================================================
// Profiles
// ============================================================================

/// Persona discriminator stored on `profiles.user_type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserType {
    Participant,
    Advertiser,
    Admin,
    Moderator,
    Other(String),
}

impl UserType {
    pub fn as_str(&self) -> &str {
        match self {
            UserType::Participant => "participante",
            UserType::Advertiser => "anunciante",
            UserType::Admin => "admin",
            UserType::Moderator => "moderador",
            UserType::Other(raw) => raw,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserType::Admin)
    }
}

impl From<String> for UserType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "participante" => UserType::Participant,
            "anunciante" => UserType::Advertiser,
            "admin" => UserType::Admin,
            "moderador" => UserType::Moderator,
            _ => UserType::Other(raw),
        }
    }
}

impl From<UserType> for String {
    fn from(user_type: UserType) -> Self {
        user_type.as_str().to_string()
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row of `profiles`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub user_type: UserType,
    #[serde(default)]
    pub credits: i64,
    #[serde(default)]
    pub rifas: i64,
    #[serde(default)]
    pub points: i64,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub email_notifications: Option<bool>,
    #[serde(default)]
    pub push_notifications: Option<bool>,
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Missions
// ============================================================================

/// Mission task type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionType {
    Form,
    Photo,
    Video,
    Checkin,
    Social,
    Coupon,
    Survey,
    Review,
    #[serde(other)]
    Other,
}

/// Row of `missions`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default = "default_mission_type")]
    pub mission_type: MissionType,
    #[serde(default)]
    pub target_audience: Option<String>,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub rifas: i64,
    #[serde(default)]
    pub cashback_reward: Option<f64>,
    #[serde(default)]
    pub cost_in_tokens: i64,
    /// Raw backend status (`ativa`, `pendente`, `encerrada`, ...)
    pub status: String,
    #[serde(default)]
    pub advertiser_id: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub streak_multiplier: Option<f64>,
}

fn default_mission_type() -> MissionType {
    MissionType::Other
}

/// Submission review stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStage {
    AdvertiserFirst,
    SecondInstance,
    Finalized,
}

/// Row of `mission_submissions`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionSubmission {
    pub id: String,
    pub mission_id: String,
    pub user_id: String,
    #[serde(default)]
    pub submission_data: Value,
    /// `pending`, `approved`, `second_instance_pending` or `rejected`
    pub status: String,
    #[serde(default)]
    pub review_stage: Option<ReviewStage>,
    #[serde(default)]
    pub validated_by: Option<String>,
    #[serde(default)]
    pub second_instance: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Raffles
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaffleStatus {
    Active,
    Pending,
    Completed,
    Canceled,
    Draft,
    Finished,
}

/// Row of `raffles`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Raffle {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub prize_type: Option<String>,
    #[serde(default)]
    pub prize_value: Option<f64>,
    #[serde(default)]
    pub numbers_total: i64,
    #[serde(default)]
    pub numbers_sold: i64,
    #[serde(default)]
    pub points_per_number: i64,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub draw_date: Option<DateTime<Utc>>,
    pub status: RaffleStatus,
    #[serde(default)]
    pub winner_user_id: Option<String>,
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Info,
    Success,
    Warning,
    Error,
    Activity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    Campaign,
    Submission,
    Payment,
    System,
    User,
    Achievement,
    Security,
}

/// Row of `notifications`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub category: NotificationCategory,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Purchases
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Pending,
    Confirmed,
    Failed,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Confirmed => "confirmed",
            PurchaseStatus::Failed => "failed",
        }
    }
}

/// Which purchase table a payment settles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseKind {
    Credit,
    Rifa,
}

impl PurchaseKind {
    pub fn table(&self) -> &'static str {
        match self {
            PurchaseKind::Credit => "credit_purchases",
            PurchaseKind::Rifa => "rifa_purchases",
        }
    }

    /// Edge function that confirms a purchase of this kind
    pub fn status_function(&self) -> &'static str {
        match self {
            PurchaseKind::Credit => "update-credit-purchase-status",
            PurchaseKind::Rifa => "update-rifa-purchase-status",
        }
    }

    /// Balance credited on confirmation, passed as `p_credit_type`
    pub fn balance(&self) -> &'static str {
        match self {
            PurchaseKind::Credit => "credits",
            PurchaseKind::Rifa => "rifas",
        }
    }
}

/// Row of `credit_purchases` / `rifa_purchases`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub base_credits: i64,
    #[serde(default)]
    pub bonus_credits: i64,
    #[serde(default)]
    pub total_credits: i64,
    pub status: PurchaseStatus,
    #[serde(default)]
    pub confirmed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_type_keeps_unknown_values() {
        let profile: Profile = serde_json::from_value(json!({
            "id": "u1",
            "user_type": "auditor"
        }))
        .unwrap();
        assert_eq!(profile.user_type, UserType::Other("auditor".to_string()));
        assert_eq!(profile.user_type.as_str(), "auditor");
        assert!(profile.active);
    }

    #[test]
    fn test_user_type_round_trips_portuguese_names() {
        let value = serde_json::to_value(UserType::Advertiser).unwrap();
        assert_eq!(value, json!("anunciante"));
        let parsed: UserType = serde_json::from_value(json!("admin")).unwrap();
        assert!(parsed.is_admin());
    }

    #[test]
    fn test_mission_type_column_and_unknown_type() {
        let mission: Mission = serde_json::from_value(json!({
            "id": "m1",
            "title": "Poste uma foto",
            "type": "photo",
            "status": "ativa",
            "is_active": true,
            "points": 50
        }))
        .unwrap();
        assert_eq!(mission.mission_type, MissionType::Photo);
        assert_eq!(mission.points, 50);

        let other: MissionType = serde_json::from_value(json!("quiz")).unwrap();
        assert_eq!(other, MissionType::Other);
    }

    #[test]
    fn test_purchase_kind_targets() {
        assert_eq!(PurchaseKind::Credit.table(), "credit_purchases");
        assert_eq!(
            PurchaseKind::Rifa.status_function(),
            "update-rifa-purchase-status"
        );
    }
}
