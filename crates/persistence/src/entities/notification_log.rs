//! Notification log entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::notification::DeliveryStatus;

/// Database row mapping for the notification_logs table.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationLogEntity {
    pub id: i64,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub task_id: Option<Uuid>,
    pub user_id: Option<String>,
    pub message: String,
    pub telegram_chat_id: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl From<NotificationLogEntity> for domain::models::NotificationLog {
    fn from(entity: NotificationLogEntity) -> Self {
        Self {
            id: entity.id,
            kind: entity.kind,
            task_id: entity.task_id,
            user_id: entity.user_id,
            message: entity.message,
            telegram_chat_id: entity.telegram_chat_id,
            status: entity.status.parse().unwrap_or(DeliveryStatus::Failed),
            timestamp: entity.timestamp,
        }
    }
}
