//! Notification delivery abstractions.
//!
//! The sender trait hides the transport (Telegram in production, an
//! in-memory recorder in tests) from the code that decides who gets what.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::models::task::Task;

/// Event data carried alongside (or instead of) a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub author_login: Option<String>,
    pub company_name: Option<String>,
    pub edrpou: Option<String>,
    pub requester_name: Option<String>,
    pub requester_id: Option<String>,
    pub request_number: Option<String>,
    pub task_id: Option<String>,
    /// Free text for system notifications.
    pub message: Option<String>,
}

/// Everything the resolver and the formatter need to know about an event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub task: Option<Task>,
    pub author_login: Option<String>,
    #[serde(default)]
    pub data: NotificationData,
}

impl NotificationPayload {
    /// Payload for a task event.
    pub fn for_task(task: Task, author_login: Option<String>) -> Self {
        Self {
            task: Some(task),
            author_login,
            data: NotificationData::default(),
        }
    }

    /// Payload for an administrator broadcast.
    pub fn system_message(message: impl Into<String>, author_login: Option<String>) -> Self {
        Self {
            task: None,
            author_login,
            data: NotificationData {
                message: Some(message.into()),
                ..Default::default()
            },
        }
    }

    /// Author login from the top level, else from `data`. Blank counts as absent.
    pub fn author(&self) -> Option<&str> {
        self.author_login
            .as_deref()
            .or(self.data.author_login.as_deref())
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }

    /// Task id for the log row.
    pub fn task_id(&self) -> Option<Uuid> {
        self.task.as_ref().map(|t| t.id).or_else(|| {
            self.data
                .task_id
                .as_deref()
                .and_then(|id| Uuid::parse_str(id.trim()).ok())
        })
    }
}

/// Result of a single send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Accepted by the transport.
    Sent,
    /// Not delivered; carries the reason.
    Failed(String),
}

impl DeliveryOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DeliveryOutcome::Sent)
    }
}

/// Sends one formatted message to one chat.
#[async_trait::async_trait]
pub trait NotificationSender: Send + Sync {
    /// Never returns an error; failures are reported as [`DeliveryOutcome::Failed`].
    async fn send(&self, chat_id: &str, html: &str) -> DeliveryOutcome;

    /// Whether the sender is able to deliver at all.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Mock sender for development and testing.
///
/// Logs and records messages but doesn't deliver them.
#[derive(Debug, Clone, Default)]
pub struct MockNotificationSender {
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock sender that fails every send.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Default::default()
        }
    }

    /// `(chat_id, html)` pairs recorded so far.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl NotificationSender for MockNotificationSender {
    async fn send(&self, chat_id: &str, html: &str) -> DeliveryOutcome {
        if self.simulate_failure {
            tracing::warn!(chat_id = %chat_id, "Mock notification sender simulating failure");
            return DeliveryOutcome::Failed("Simulated failure".to_string());
        }

        tracing::info!(
            chat_id = %chat_id,
            length = html.len(),
            "Mock: Would send Telegram message"
        );
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((chat_id.to_string(), html.to_string()));
        }
        DeliveryOutcome::Sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_author_prefers_top_level() {
        let payload: NotificationPayload = serde_json::from_value(json!({
            "authorLogin": "ivan",
            "data": {"authorLogin": "petro"}
        }))
        .unwrap();
        assert_eq!(payload.author(), Some("ivan"));

        let payload: NotificationPayload = serde_json::from_value(json!({
            "data": {"authorLogin": "petro"}
        }))
        .unwrap();
        assert_eq!(payload.author(), Some("petro"));

        let payload = NotificationPayload::system_message("hi", Some("  ".into()));
        assert_eq!(payload.author(), None);
    }

    #[test]
    fn test_task_id_from_data() {
        let id = Uuid::new_v4();
        let payload = NotificationPayload {
            data: NotificationData {
                task_id: Some(id.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(payload.task_id(), Some(id));

        let payload = NotificationPayload::for_task(Task::new(Uuid::nil()), None);
        assert_eq!(payload.task_id(), Some(Uuid::nil()));
    }

    #[tokio::test]
    async fn test_mock_sender_records() {
        let sender = MockNotificationSender::new();
        let outcome = sender.send("42", "<b>hi</b>").await;
        assert_eq!(outcome, DeliveryOutcome::Sent);
        assert_eq!(sender.sent(), vec![("42".to_string(), "<b>hi</b>".to_string())]);
    }

    #[tokio::test]
    async fn test_mock_sender_failure() {
        let sender = MockNotificationSender::failing();
        let outcome = sender.send("42", "hi").await;
        assert!(matches!(outcome, DeliveryOutcome::Failed(_)));
        assert!(sender.sent().is_empty());
    }
}
