//! Common types used across the ledger

use chrono::{DateTime, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Inclusive date range for queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// A single day
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// The calendar month starting at `first_day`
    pub fn month(first_day: NaiveDate) -> Option<Self> {
        let next = first_day.checked_add_months(Months::new(1))?;
        Some(Self {
            start: first_day,
            end: next.pred_opt()?,
        })
    }

    /// Half-open timestamp bounds `[start 00:00, end + 1 day 00:00)` in UTC
    pub fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let lower = self.start.and_time(NaiveTime::MIN).and_utc();
        let upper = self
            .end
            .succ_opt()
            .unwrap_or(self.end)
            .and_time(NaiveTime::MIN)
            .and_utc();
        (lower, upper)
    }
}
