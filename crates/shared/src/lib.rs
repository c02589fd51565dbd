//! Shared utilities and common types for the DTS backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Lenient parsing of decimal amounts stored as strings
//! - The `MM-YYYY` reporting period type
//! - HTML escaping for Telegram messages
//! - Common validation logic

pub mod html;
pub mod money;
pub mod period;
pub mod validation;
