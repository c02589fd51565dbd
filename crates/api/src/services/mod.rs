//! Notification delivery services.

pub mod dispatcher;
pub mod telegram;

pub use dispatcher::{DispatchSummary, NotificationDispatcher, NotificationStore, PgNotificationStore};
pub use telegram::{TelegramClient, TelegramError};
