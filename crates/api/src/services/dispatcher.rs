//! Notification dispatch: format, resolve recipients, send, and log.

use std::sync::Arc;

use async_trait::async_trait;
use domain::models::notification::{DeliveryStatus, NewNotificationLog, NotificationKind};
use domain::models::User;
use domain::services::{
    format_message, resolve_recipients, DeliveryOutcome, NotificationPayload, NotificationSender,
};
use persistence::repositories::{NotificationLogRepository, UserRepository};
use sqlx::PgPool;

use crate::middleware::metrics::record_notification;

/// Storage the dispatcher reads recipients from and appends log rows to.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Users possibly subscribed to `kind`, loaded fresh on every dispatch.
    async fn candidates(&self, kind: NotificationKind) -> Result<Vec<User>, sqlx::Error>;

    async fn append_log(&self, log: &NewNotificationLog) -> Result<(), sqlx::Error>;
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgNotificationStore {
    users: UserRepository,
    logs: NotificationLogRepository,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            logs: NotificationLogRepository::new(pool),
        }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn candidates(&self, kind: NotificationKind) -> Result<Vec<User>, sqlx::Error> {
        let users = self.users.list_notification_candidates(kind).await?;
        Ok(users.into_iter().map(User::from).collect())
    }

    async fn append_log(&self, log: &NewNotificationLog) -> Result<(), sqlx::Error> {
        self.logs.insert(log).await.map(|_| ())
    }
}

/// Counts reported by one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub attempted: usize,
    pub sent: usize,
}

/// Delivers events to subscribed users.
///
/// Failures are logged and swallowed: dispatch never fails its caller.
#[derive(Clone)]
pub struct NotificationDispatcher {
    store: Arc<dyn NotificationStore>,
    sender: Arc<dyn NotificationSender>,
}

impl NotificationDispatcher {
    pub fn new(store: Arc<dyn NotificationStore>, sender: Arc<dyn NotificationSender>) -> Self {
        Self { store, sender }
    }

    pub fn sender(&self) -> &Arc<dyn NotificationSender> {
        &self.sender
    }

    /// Sends `kind` to every resolved recipient, one at a time, logging each attempt.
    pub async fn dispatch(&self, kind: NotificationKind, payload: NotificationPayload) -> DispatchSummary {
        let message = format_message(kind, &payload);

        let users = match self.store.candidates(kind).await {
            Ok(users) => users,
            Err(e) => {
                tracing::error!(error = %e, kind = %kind, "Failed to load notification recipients");
                return DispatchSummary::default();
            }
        };

        let recipients = resolve_recipients(kind, &payload, &users);
        if recipients.is_empty() {
            tracing::debug!(kind = %kind, "No recipients for notification");
            return DispatchSummary::default();
        }

        let task_id = payload.task_id();
        let author = payload.author().map(str::to_string);
        let mut summary = DispatchSummary::default();

        for recipient in recipients {
            summary.attempted += 1;
            let outcome = self.sender.send(&recipient.chat_id, &message).await;
            let status = match &outcome {
                DeliveryOutcome::Sent => {
                    summary.sent += 1;
                    DeliveryStatus::Sent
                }
                DeliveryOutcome::Failed(reason) => {
                    tracing::warn!(
                        kind = %kind,
                        login = %recipient.login,
                        reason = %reason,
                        "Notification not delivered"
                    );
                    DeliveryStatus::Failed
                }
            };
            record_notification(kind, outcome.is_sent());

            let log = NewNotificationLog {
                kind,
                task_id,
                user_id: author.clone(),
                message: message.clone(),
                telegram_chat_id: recipient.chat_id,
                status,
            };
            if let Err(e) = self.store.append_log(&log).await {
                tracing::error!(error = %e, kind = %kind, "Failed to append notification log");
            }
        }

        tracing::info!(
            kind = %kind,
            attempted = summary.attempted,
            sent = summary.sent,
            "Notification dispatched"
        );
        summary
    }

    /// Runs [`dispatch`](Self::dispatch) on the runtime without waiting for it.
    pub fn spawn(&self, kind: NotificationKind, payload: NotificationPayload) {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            dispatcher.dispatch(kind, payload).await;
        });
    }
}
