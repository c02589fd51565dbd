//! Common validation utilities.

use validator::ValidationError;

/// Earliest year accepted for reporting periods.
const MIN_YEAR: i32 = 2000;

/// Latest year accepted for reporting periods.
const MAX_YEAR: i32 = 2100;

/// Validates that a month number is within 1-12.
pub fn validate_month(month: u32) -> Result<(), ValidationError> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        let mut err = ValidationError::new("month_range");
        err.message = Some("Month must be between 1 and 12".into());
        Err(err)
    }
}

/// Validates that a year is within the supported reporting window.
pub fn validate_year(year: i32) -> Result<(), ValidationError> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(())
    } else {
        let mut err = ValidationError::new("year_range");
        err.message = Some("Year must be between 2000 and 2100".into());
        Err(err)
    }
}

/// Validates that a login is non-blank and has no surrounding whitespace.
pub fn validate_login(login: &str) -> Result<(), ValidationError> {
    if !login.is_empty() && login.trim() == login {
        Ok(())
    } else {
        let mut err = ValidationError::new("login_format");
        err.message = Some("Login must be non-empty without leading or trailing spaces".into());
        Err(err)
    }
}
