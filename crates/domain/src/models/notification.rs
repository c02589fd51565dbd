//! Notification kinds, per-user settings, and the delivery log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Event kinds a user can subscribe to.
///
/// Each kind has two textual forms: the settings key stored on the user
/// (`newRequests`) and the wire name written to the log (`new_requests`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    NewRequests,
    PendingApproval,
    AccountantApproval,
    ApprovedRequests,
    RejectedRequests,
    InvoiceRequests,
    CompletedInvoices,
    SystemNotifications,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 8] = [
        NotificationKind::NewRequests,
        NotificationKind::PendingApproval,
        NotificationKind::AccountantApproval,
        NotificationKind::ApprovedRequests,
        NotificationKind::RejectedRequests,
        NotificationKind::InvoiceRequests,
        NotificationKind::CompletedInvoices,
        NotificationKind::SystemNotifications,
    ];

    /// Key inside `notificationSettings`.
    pub fn settings_key(&self) -> &'static str {
        match self {
            NotificationKind::NewRequests => "newRequests",
            NotificationKind::PendingApproval => "pendingApproval",
            NotificationKind::AccountantApproval => "accountantApproval",
            NotificationKind::ApprovedRequests => "approvedRequests",
            NotificationKind::RejectedRequests => "rejectedRequests",
            NotificationKind::InvoiceRequests => "invoiceRequests",
            NotificationKind::CompletedInvoices => "completedInvoices",
            NotificationKind::SystemNotifications => "systemNotifications",
        }
    }

    /// Event name used in the notification log.
    pub fn wire_name(&self) -> &'static str {
        match self {
            NotificationKind::NewRequests => "new_requests",
            NotificationKind::PendingApproval => "pending_approval",
            NotificationKind::AccountantApproval => "accountant_approval",
            NotificationKind::ApprovedRequests => "approved_requests",
            NotificationKind::RejectedRequests => "rejected_requests",
            NotificationKind::InvoiceRequests => "invoice_requested",
            NotificationKind::CompletedInvoices => "invoice_completed",
            NotificationKind::SystemNotifications => "system_notifications",
        }
    }

    /// Whether recipients are narrowed by the task's region.
    pub fn is_region_scoped(&self) -> bool {
        !matches!(self, NotificationKind::SystemNotifications)
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = String;

    /// Accepts either the settings key or the wire name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        NotificationKind::ALL
            .into_iter()
            .find(|k| k.settings_key() == s || k.wire_name() == s)
            .ok_or_else(|| format!("Unknown notification type: {}", s))
    }
}

impl Serialize for NotificationKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

impl<'de> Deserialize<'de> for NotificationKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Per-user subscription flags, one per [`NotificationKind`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct NotificationSettings {
    pub new_requests: bool,
    pub pending_approval: bool,
    pub accountant_approval: bool,
    pub approved_requests: bool,
    pub rejected_requests: bool,
    pub invoice_requests: bool,
    pub completed_invoices: bool,
    pub system_notifications: bool,
}

impl NotificationSettings {
    /// Every flag enabled.
    pub fn all() -> Self {
        let mut settings = Self::default();
        for kind in NotificationKind::ALL {
            settings.set(kind, true);
        }
        settings
    }

    pub fn get(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::NewRequests => self.new_requests,
            NotificationKind::PendingApproval => self.pending_approval,
            NotificationKind::AccountantApproval => self.accountant_approval,
            NotificationKind::ApprovedRequests => self.approved_requests,
            NotificationKind::RejectedRequests => self.rejected_requests,
            NotificationKind::InvoiceRequests => self.invoice_requests,
            NotificationKind::CompletedInvoices => self.completed_invoices,
            NotificationKind::SystemNotifications => self.system_notifications,
        }
    }

    pub fn set(&mut self, kind: NotificationKind, enabled: bool) {
        let flag = match kind {
            NotificationKind::NewRequests => &mut self.new_requests,
            NotificationKind::PendingApproval => &mut self.pending_approval,
            NotificationKind::AccountantApproval => &mut self.accountant_approval,
            NotificationKind::ApprovedRequests => &mut self.approved_requests,
            NotificationKind::RejectedRequests => &mut self.rejected_requests,
            NotificationKind::InvoiceRequests => &mut self.invoice_requests,
            NotificationKind::CompletedInvoices => &mut self.completed_invoices,
            NotificationKind::SystemNotifications => &mut self.system_notifications,
        };
        *flag = enabled;
    }
}

/// Outcome recorded for one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(DeliveryStatus::Sent),
            "failed" => Ok(DeliveryStatus::Failed),
            other => Err(format!("Invalid delivery status: {}", other)),
        }
    }
}

/// One row of the append-only delivery log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationLog {
    pub id: i64,
    /// Kind wire name; unknown kinds from older rows are kept as text.
    #[serde(rename = "type")]
    pub kind: String,
    pub task_id: Option<Uuid>,
    /// Login of the author that triggered the event.
    pub user_id: Option<String>,
    pub message: String,
    pub telegram_chat_id: String,
    pub status: DeliveryStatus,
    pub timestamp: DateTime<Utc>,
}

/// Log row to append.
#[derive(Debug, Clone)]
pub struct NewNotificationLog {
    pub kind: NotificationKind,
    pub task_id: Option<Uuid>,
    pub user_id: Option<String>,
    pub message: String,
    pub telegram_chat_id: String,
    pub status: DeliveryStatus,
}

/// Query parameters for paging the log.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationLogQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(rename = "type")]
    pub kind: Option<NotificationKind>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    50
}

impl NotificationLogQuery {
    /// Page clamped to at least 1.
    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    /// Limit clamped to 1..=200.
    pub fn limit(&self) -> u32 {
        self.limit.clamp(1, 200)
    }

    pub fn offset(&self) -> i64 {
        (self.page() as i64 - 1) * self.limit() as i64
    }
}

/// One page of the log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationLogPage {
    pub logs: Vec<NotificationLog>,
    pub total: i64,
    pub page: u32,
    pub pages: i64,
}

impl NotificationLogPage {
    pub fn new(logs: Vec<NotificationLog>, total: i64, page: u32, limit: u32) -> Self {
        let limit = limit.max(1) as i64;
        Self {
            logs,
            total,
            page,
            pages: (total + limit - 1) / limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_parses_both_forms() {
        for kind in NotificationKind::ALL {
            assert_eq!(kind.settings_key().parse::<NotificationKind>().unwrap(), kind);
            assert_eq!(kind.wire_name().parse::<NotificationKind>().unwrap(), kind);
        }
        assert!("coffee".parse::<NotificationKind>().is_err());
    }

    #[test]
    fn test_invoice_kinds_have_distinct_forms() {
        assert_eq!(NotificationKind::InvoiceRequests.settings_key(), "invoiceRequests");
        assert_eq!(NotificationKind::InvoiceRequests.wire_name(), "invoice_requested");
        assert_eq!(NotificationKind::CompletedInvoices.wire_name(), "invoice_completed");
    }

    #[test]
    fn test_settings_get_set() {
        let mut settings = NotificationSettings::default();
        assert!(!settings.get(NotificationKind::NewRequests));
        settings.set(NotificationKind::NewRequests, true);
        assert!(settings.get(NotificationKind::NewRequests));
        assert!(!settings.get(NotificationKind::RejectedRequests));

        let all = NotificationSettings::all();
        assert!(NotificationKind::ALL.iter().all(|k| all.get(*k)));
    }

    #[test]
    fn test_settings_deserialize_defaults_and_rejects_unknown() {
        let s: NotificationSettings =
            serde_json::from_value(json!({"pendingApproval": true})).unwrap();
        assert!(s.pending_approval);
        assert!(!s.new_requests);

        assert!(serde_json::from_value::<NotificationSettings>(json!({"newRequest": true})).is_err());
    }

    #[test]
    fn test_log_page_count() {
        assert_eq!(NotificationLogPage::new(vec![], 0, 1, 50).pages, 0);
        assert_eq!(NotificationLogPage::new(vec![], 50, 1, 50).pages, 1);
        assert_eq!(NotificationLogPage::new(vec![], 51, 1, 50).pages, 2);
    }

    #[test]
    fn test_log_query_clamps() {
        let q: NotificationLogQuery = serde_json::from_value(json!({"page": 0, "limit": 1000})).unwrap();
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), 200);
        assert_eq!(q.offset(), 0);

        let q: NotificationLogQuery = serde_json::from_value(json!({"page": 3})).unwrap();
        assert_eq!(q.offset(), 100);
    }
}
