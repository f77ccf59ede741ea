//! User notifications
//!
//! Every read and write is scoped to the owning user except
//! [`NotificationService::create`], which admins use to notify anyone.

use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use validator::Validate;

use crate::baas::{decode_rows, Baas, BaasError, Direction, Query};
use crate::error::ApiError;
use crate::models::{Notification, NotificationCategory, NotificationType};

const TABLE: &str = "notifications";

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Notification {0} not found")]
    NotFound(String),

    #[error("Backend error: {0}")]
    Backend(#[from] BaasError),
}

impl From<NotificationError> for ApiError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::NotFound(_) => ApiError::NotFound(err.to_string()),
            NotificationError::Backend(source) => ApiError::Upstream {
                message: "Failed to access notifications".to_string(),
                details: Some(source.to_string()),
            },
        }
    }
}

/// Admin request to notify a user
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateNotificationRequest {
    #[validate(length(min = 1))]
    pub user_id: String,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    #[serde(rename = "type", default = "default_type")]
    pub notification_type: NotificationType,
    #[serde(default = "default_category")]
    pub category: NotificationCategory,
}

fn default_type() -> NotificationType {
    NotificationType::Info
}

fn default_category() -> NotificationCategory {
    NotificationCategory::System
}

pub struct NotificationService {
    baas: Arc<dyn Baas>,
}

impl NotificationService {
    pub fn new(baas: Arc<dyn Baas>) -> Self {
        Self { baas }
    }

    fn owned(user_id: &str) -> Query {
        Query::table(TABLE).eq("user_id", user_id)
    }

    /// The user's notifications, newest first
    pub async fn list(&self, user_id: &str) -> Result<Vec<Notification>, NotificationError> {
        let rows = self
            .baas
            .select(&Self::owned(user_id).order("created_at", Direction::Desc))
            .await?;
        Ok(decode_rows(rows)?)
    }

    pub async fn mark_read(
        &self,
        user_id: &str,
        notification_id: &str,
    ) -> Result<Notification, NotificationError> {
        let updated = self
            .baas
            .update(
                &Self::owned(user_id).eq("id", notification_id),
                json!({ "read": true }),
            )
            .await?;

        decode_rows::<Notification>(updated)?
            .into_iter()
            .next()
            .ok_or_else(|| NotificationError::NotFound(notification_id.to_string()))
    }

    /// Returns how many notifications changed
    pub async fn mark_all_read(&self, user_id: &str) -> Result<usize, NotificationError> {
        let updated = self
            .baas
            .update(&Self::owned(user_id).eq("read", false), json!({ "read": true }))
            .await?;
        tracing::debug!(user_id = %user_id, count = updated.len(), "Notifications marked read");
        Ok(updated.len())
    }

    pub async fn delete(&self, user_id: &str, notification_id: &str) -> Result<(), NotificationError> {
        let removed = self
            .baas
            .delete(&Self::owned(user_id).eq("id", notification_id))
            .await?;
        if removed == 0 {
            return Err(NotificationError::NotFound(notification_id.to_string()));
        }
        Ok(())
    }

    pub async fn create(
        &self,
        admin_id: &str,
        request: CreateNotificationRequest,
    ) -> Result<Notification, NotificationError> {
        let row = self
            .baas
            .insert(
                TABLE,
                json!({
                    "user_id": request.user_id,
                    "title": request.title,
                    "message": request.message,
                    "type": request.notification_type,
                    "category": request.category,
                    "read": false,
                }),
            )
            .await?;

        tracing::info!(admin_id = %admin_id, user_id = %request.user_id, "Custom notification sent");
        Ok(serde_json::from_value(row).map_err(BaasError::from)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baas::MemoryBaas;

    fn service() -> (Arc<MemoryBaas>, NotificationService) {
        let baas = Arc::new(MemoryBaas::new());
        for (id, user, created) in [
            ("n1", "u1", "2024-01-01T00:00:00Z"),
            ("n2", "u1", "2024-02-01T00:00:00Z"),
            ("n3", "u2", "2024-03-01T00:00:00Z"),
        ] {
            baas.seed(
                TABLE,
                json!({
                    "id": id,
                    "user_id": user,
                    "title": "t",
                    "message": "m",
                    "type": "info",
                    "category": "system",
                    "read": false,
                    "created_at": created
                }),
            );
        }
        (baas.clone(), NotificationService::new(baas))
    }

    #[tokio::test]
    async fn test_list_is_owner_scoped_newest_first() {
        let (_, service) = service();
        let ids: Vec<String> = service
            .list("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec!["n2", "n1"]);
    }

    #[tokio::test]
    async fn test_cannot_touch_other_users_notifications() {
        let (baas, service) = service();
        assert!(matches!(
            service.mark_read("u1", "n3").await,
            Err(NotificationError::NotFound(_))
        ));
        assert!(matches!(
            service.delete("u1", "n3").await,
            Err(NotificationError::NotFound(_))
        ));
        assert_eq!(baas.rows(TABLE).len(), 3);
    }

    #[tokio::test]
    async fn test_mark_all_read() {
        let (_, service) = service();
        assert_eq!(service.mark_all_read("u1").await.unwrap(), 2);
        assert_eq!(service.mark_all_read("u1").await.unwrap(), 0);
        assert!(service.list("u1").await.unwrap().iter().all(|n| n.read));
    }

    #[tokio::test]
    async fn test_admin_create() {
        let (baas, service) = service();
        let request: CreateNotificationRequest = serde_json::from_value(json!({
            "user_id": "u2",
            "title": "Bem-vindo",
            "message": "Sua conta foi verificada"
        }))
        .unwrap();
        assert!(request.validate().is_ok());

        let created = service.create("admin-1", request).await.unwrap();
        assert_eq!(created.user_id, "u2");
        assert_eq!(created.notification_type, NotificationType::Info);
        assert_eq!(baas.rows(TABLE).len(), 4);
    }
}
