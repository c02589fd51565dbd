//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod expense_record;
pub mod notification_log;
pub mod reference;
pub mod task;
pub mod user;

pub use expense_record::ExpenseRecordEntity;
pub use notification_log::NotificationLogEntity;
pub use reference::{RegionEntity, RoleEntity};
pub use task::TaskEntity;
pub use user::UserEntity;
