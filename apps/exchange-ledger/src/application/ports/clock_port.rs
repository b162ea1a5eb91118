//! Clock Port
//!
//! Source of "now" in desk-local time. Dates, periods and the daily
//! rollup key all derive from it.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use parking_lot::Mutex;

use crate::domain::shared::Period;

/// Provides the current local date and time.
pub trait Clock: Send + Sync {
    /// Current local timestamp, truncated to whole seconds.
    fn now(&self) -> NaiveDateTime;

    /// Current calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// Period containing today.
    fn current_period(&self) -> Period {
        Period::of(self.today())
    }
}

/// Wall clock in the host's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        let now = chrono::Local::now().naive_local();
        now.with_nanosecond(0).unwrap_or(now)
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    /// Clock frozen at `now`.
    #[must_use]
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Clock frozen at midday of `date`.
    #[must_use]
    pub fn at_date(date: NaiveDate) -> Self {
        Self::new(date.and_time(chrono::NaiveTime::MIN) + TimeDelta::hours(12))
    }

    /// Jump to `now`.
    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock() = now;
    }

    /// Move forward by `delta`.
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock();
        *now += delta;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 31).unwrap();
        let clock = FixedClock::at_date(day);
        assert_eq!(clock.today(), day);
        clock.advance(TimeDelta::days(1));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 11, 1).unwrap());
        assert_eq!(clock.current_period(), Period::new(2026, 11).unwrap());
    }

    #[test]
    fn system_clock_has_whole_seconds() {
        assert_eq!(SystemClock.now().nanosecond(), 0);
    }
}
