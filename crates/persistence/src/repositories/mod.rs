//! Repository implementations for database operations.

pub mod expense_record;
pub mod notification_log;
pub mod reference;
pub mod task;
pub mod user;

pub use expense_record::ExpenseRecordRepository;
pub use notification_log::NotificationLogRepository;
pub use reference::ReferenceRepository;
pub use task::{TaskListQuery, TaskRepository};
pub use user::{UserRepository, UserUpsertInput};
