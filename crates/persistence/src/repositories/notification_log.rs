//! Notification log repository for database operations.

use sqlx::PgPool;

use domain::models::notification::{NewNotificationLog, NotificationKind};

use crate::entities::NotificationLogEntity;
use crate::metrics::QueryTimer;

/// Repository for the append-only notification log.
#[derive(Clone)]
pub struct NotificationLogRepository {
    pool: PgPool,
}

impl NotificationLogRepository {
    /// Creates a new NotificationLogRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append one delivery attempt.
    pub async fn insert(&self, log: &NewNotificationLog) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("insert_notification_log");

        let result: Result<(i64,), sqlx::Error> = sqlx::query_as(
            r#"
            INSERT INTO notification_logs (type, task_id, user_id, message, telegram_chat_id, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(log.kind.wire_name())
        .bind(log.task_id)
        .bind(&log.user_id)
        .bind(&log.message)
        .bind(&log.telegram_chat_id)
        .bind(log.status.as_str())
        .fetch_one(&self.pool)
        .await;

        timer.record();
        Ok(result?.0)
    }

    /// One page of the log, newest first.
    pub async fn list(
        &self,
        kind: Option<NotificationKind>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NotificationLogEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_notification_logs");

        let result = sqlx::query_as::<_, NotificationLogEntity>(
            r#"
            SELECT id, type, task_id, user_id, message, telegram_chat_id, status, timestamp
            FROM notification_logs
            WHERE ($1::text IS NULL OR type = $1)
            ORDER BY timestamp DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(kind.map(|k| k.wire_name()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Number of rows, optionally of one kind.
    pub async fn count(&self, kind: Option<NotificationKind>) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_notification_logs");

        let result: Result<(i64,), sqlx::Error> = sqlx::query_as(
            "SELECT COUNT(*) FROM notification_logs WHERE ($1::text IS NULL OR type = $1)",
        )
        .bind(kind.map(|k| k.wire_name()))
        .fetch_one(&self.pool)
        .await;

        timer.record();
        Ok(result?.0)
    }
}
