//! Calendar month used to partition every ledger table.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::shared::LedgerError;

/// A calendar month. Tables are partitioned by period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Build a period, rejecting months outside `1..=12`.
    pub fn new(year: i32, month: u32) -> Result<Self, LedgerError> {
        if !(1..=12).contains(&month) {
            return Err(LedgerError::validation(format!(
                "Month must be between 1 and 12, got {month}."
            )));
        }
        Ok(Self { year, month })
    }

    /// Period containing `date`.
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Month, 1-based.
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// The month immediately before this one.
    #[must_use]
    pub const fn previous(&self) -> Self {
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

    /// The month immediately after this one.
    #[must_use]
    pub const fn next(&self) -> Self {
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

    /// First calendar day of the period.
    #[must_use]
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    /// Whether `date` falls inside the period.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::of(date) == *self
    }

    /// Storage suffix, e.g. `2026_10`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{:04}_{:02}", self.year, self.month)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = LedgerError;

    /// Accepts `YYYY-MM` and the storage form `YYYY_MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LedgerError::validation(format!("Invalid period: {s:?}."));
        let (year, month) = s.trim().split_once(['-', '_']).ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}
