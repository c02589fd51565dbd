//! Domain services for the DTS backend.
//!
//! Services contain business logic that operates on domain models.

pub mod analytics;
pub mod approval;
pub mod expenses;
pub mod message;
pub mod notification;
pub mod recipients;

pub use analytics::{aggregate, employee_rating, revenue_details, AnalyticsError};
pub use approval::{
    apply_gate, apply_update, backfill_bonus_dates, bonus_eligible, derive_events,
    latch_bonus_date, ApprovalError, BackfillReport, UpdateOutcome,
};
pub use expenses::{orphaned_keys, plan_copy_previous, previous_key, strip_orphans, CopyPlan};
pub use message::{format_message, format_message_at};
pub use notification::{
    DeliveryOutcome, MockNotificationSender, NotificationData, NotificationPayload,
    NotificationSender,
};
pub use recipients::{resolve_recipients, Recipient};
