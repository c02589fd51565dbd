//! Recipient resolution for Telegram notifications.

use crate::models::notification::NotificationKind;
use crate::models::user::User;

use super::notification::NotificationPayload;

/// A user selected to receive a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub login: String,
    pub chat_id: String,
}

/// Selects the users who should receive an event, preserving input order.
///
/// A user qualifies when they have a usable chat id, are subscribed to the
/// kind, cover the task's region (unless the kind is broadcast-wide), and
/// are not the event's author.
pub fn resolve_recipients(
    kind: NotificationKind,
    payload: &NotificationPayload,
    users: &[User],
) -> Vec<Recipient> {
    let task_region = payload
        .task
        .as_ref()
        .filter(|_| kind.is_region_scoped())
        .map(|task| task.service_region.as_deref().unwrap_or(""));
    let author = payload.author();

    users
        .iter()
        .filter(|user| user.notification_settings.get(kind))
        .filter_map(|user| user.usable_chat_id().map(|chat_id| (user, chat_id)))
        .filter(|(user, _)| match task_region {
            Some(region) => {
                user.covers_all_regions() || regions_overlap(user.region.as_deref(), region)
            }
            None => true,
        })
        .filter(|(user, _)| author != Some(user.login.as_str()))
        .map(|(user, chat_id)| Recipient {
            login: user.login.clone(),
            chat_id: chat_id.to_string(),
        })
        .collect()
}

/// True when any comma-separated token of `user_region` and `task_region`
/// contain one another, ignoring case. Empty tokens never match.
fn regions_overlap(user_region: Option<&str>, task_region: &str) -> bool {
    let task_region = task_region.trim().to_lowercase();
    if task_region.is_empty() {
        return false;
    }

    user_region
        .unwrap_or("")
        .split(',')
        .map(|token| token.trim().to_lowercase())
        .filter(|token| !token.is_empty())
        .any(|token| task_region.contains(&token) || token.contains(&task_region))
}
