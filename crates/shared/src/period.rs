//! Reporting period (`MM-YYYY`) handling.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

lazy_static::lazy_static! {
    static ref PERIOD_REGEX: regex::Regex = regex::Regex::new(r"^(\d{1,2})-(\d{4})$").unwrap();
}

/// Error type for period parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeriodError {
    #[error("Invalid period format: {0} (expected MM-YYYY)")]
    InvalidFormat(String),
    #[error("Month out of range: {0}")]
    InvalidMonth(u32),
}

/// A calendar month, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthYear {
    pub year: i32,
    pub month: u32,
}

impl MonthYear {
    /// Creates a period, rejecting months outside 1-12.
    pub fn new(year: i32, month: u32) -> Result<Self, PeriodError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodError::InvalidMonth(month));
        }
        Ok(Self { year, month })
    }

    /// Period containing the given date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Period containing the given instant.
    pub fn from_datetime<Tz: TimeZone>(at: &DateTime<Tz>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }

    /// The month before this one (January rolls back to December).
    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// The month after this one.
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Number of months from `self` to `other`, inclusive. Zero if `other` is earlier.
    pub fn months_until(self, other: MonthYear) -> u32 {
        let start = self.year as i64 * 12 + self.month as i64;
        let end = other.year as i64 * 12 + other.month as i64;
        if end < start {
            0
        } else {
            (end - start + 1) as u32
        }
    }

    /// All months from `start` to `end` inclusive.
    pub fn range_inclusive(start: MonthYear, end: MonthYear) -> Vec<MonthYear> {
        let mut out = Vec::with_capacity(start.months_until(end) as usize);
        let mut current = start;
        while current <= end {
            out.push(current);
            current = current.next();
        }
        out
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{}", self.month, self.year)
    }
}

impl FromStr for MonthYear {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let caps = PERIOD_REGEX
            .captures(trimmed)
            .ok_or_else(|| PeriodError::InvalidFormat(s.to_string()))?;
        let month: u32 = caps[1]
            .parse()
            .map_err(|_| PeriodError::InvalidFormat(s.to_string()))?;
        let year: i32 = caps[2]
            .parse()
            .map_err(|_| PeriodError::InvalidFormat(s.to_string()))?;
        MonthYear::new(year, month)
    }
}

impl Serialize for MonthYear {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MonthYear {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
