//! HTTP route handlers.

pub mod analytics;
pub mod expense_categories;
pub mod health;
pub mod notifications;
pub mod reference;
pub mod tasks;
pub mod users;
