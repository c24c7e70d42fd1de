//! Business date: the calendar day a cash record belongs to.

use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Calendar day, distinct from any wall-clock timestamp.
///
/// A cash record is keyed by a `BusinessDate`; the same-day rule for reopen
/// compares two of these, never timestamps.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusinessDate(NaiveDate);

impl BusinessDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// The current business date in the server's local timezone.
    pub fn today() -> Self {
        Self(chrono::Local::now().date_naive())
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for BusinessDate {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

impl core::fmt::Display for BusinessDate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for BusinessDate {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| DomainError::invalid_id(format!("BusinessDate: {e}")))?;
        Ok(Self(date))
    }
}
