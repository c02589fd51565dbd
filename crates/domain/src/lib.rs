//! Domain layer for the DTS service backend.
//!
//! This crate contains:
//! - Domain models (Task, User, NotificationLog, ExpenseRecord)
//! - Business logic services (recipients, messages, analytics, approvals)
//! - Domain error types

pub mod models;
pub mod services;
