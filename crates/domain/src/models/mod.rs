//! Domain models for the DTS backend.

pub mod analytics;
pub mod notification;
pub mod reference;
pub mod task;
pub mod user;

pub use analytics::{CategoryConfig, ExpenseCategory, ExpenseRecord, PeriodRow};
pub use notification::{NotificationKind, NotificationLog, NotificationSettings};
pub use reference::{AccessRules, Region, Role};
pub use task::{ApprovalGate, ApprovalState, Task, TaskStatus};
pub use user::User;
