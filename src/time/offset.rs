use std::{fmt, ops::Neg};

use chrono::{Duration, Months, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{DataError, PanelwiseResult};

/// A calendar-aware duration made of whole months and whole days.
///
/// Months are applied first, then days. Month arithmetic keeps the day of month and clamps it
/// to the last day of the target month when it does not exist there, so
/// `2024-02-29 + 12 months == 2025-02-28` and `2023-01-31 + 1 month == 2023-02-28`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CalendarOffset {
    months: i32,
    days: i32,
}

impl CalendarOffset {
    pub const fn new(months: i32, days: i32) -> Self {
        Self { months, days }
    }

    pub fn years(years: i32) -> Self {
        Self::new(years.saturating_mul(12), 0)
    }

    pub const fn months(months: i32) -> Self {
        Self::new(months, 0)
    }

    pub fn weeks(weeks: i32) -> Self {
        Self::new(0, weeks.saturating_mul(7))
    }

    pub const fn days(days: i32) -> Self {
        Self::new(0, days)
    }

    pub fn month_count(&self) -> i32 {
        self.months
    }

    pub fn day_count(&self) -> i32 {
        self.days
    }

    pub fn is_zero(&self) -> bool {
        self.months == 0 && self.days == 0
    }

    /// Repeats the offset `times` times, e.g. one week times six.
    pub fn checked_mul(self, times: u32) -> Option<Self> {
        let times = i32::try_from(times).ok()?;
        Some(Self {
            months: self.months.checked_mul(times)?,
            days: self.days.checked_mul(times)?,
        })
    }

    /// Shifts `ts` forward by this offset.
    pub fn add_to(&self, ts: NaiveDateTime) -> PanelwiseResult<NaiveDateTime> {
        let months = Months::new(self.months.unsigned_abs());
        let shifted = if self.months >= 0 {
            ts.checked_add_months(months)
        } else {
            ts.checked_sub_months(months)
        };

        shifted
            .and_then(|t| t.checked_add_signed(Duration::days(i64::from(self.days))))
            .ok_or_else(|| DataError::TimestampOverflow(format!("{ts} shifted by {self}")).into())
    }

    /// Shifts `ts` backward by this offset.
    pub fn sub_from(&self, ts: NaiveDateTime) -> PanelwiseResult<NaiveDateTime> {
        (-*self).add_to(ts)
    }
}

impl Neg for CalendarOffset {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self {
            months: self.months.saturating_neg(),
            days: self.days.saturating_neg(),
        }
    }
}

impl fmt::Display for CalendarOffset {
    /// Human-readable form, e.g. `1 year, 2 months, 3 days`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = [
            (self.months / 12, "year"),
            (self.months % 12, "month"),
            (self.days, "day"),
        ];

        let rendered = parts
            .iter()
            .filter(|(amount, _)| *amount != 0)
            .map(|(amount, unit)| {
                let plural = if amount.unsigned_abs() > 1 { "s" } else { "" };
                format!("{amount} {unit}{plural}")
            })
            .collect::<Vec<_>>();

        if rendered.is_empty() {
            return write!(f, "0 days");
        }
        write!(f, "{}", rendered.join(", "))
    }
}
