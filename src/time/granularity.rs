use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use polars::prelude::PlSmallStr;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{
    error::{ConfigError, PanelwiseResult},
    table::TimeTable,
    time::{bounds::Bounds, offset::CalendarOffset, zone::localize},
};

/// Calendar bucket size of a panel.
///
/// Each variant owns two rules: how a timestamp is clamped to the start of its bucket, and how
/// the evaluation window is placed relative to the most recent observation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// Buckets start at midnight.
    Daily,
    /// Buckets start at midnight on Monday.
    Weekly,
    /// Buckets start at midnight on the first day of the month.
    Monthly,
}

impl Granularity {
    pub fn is_daily(&self) -> bool {
        matches!(self, Self::Daily)
    }

    pub fn is_weekly(&self) -> bool {
        matches!(self, Self::Weekly)
    }

    pub fn is_monthly(&self) -> bool {
        matches!(self, Self::Monthly)
    }

    /// Window size used when a panel is built without an explicit one.
    pub fn default_window(&self) -> u32 {
        match self {
            Self::Daily => 7,
            Self::Weekly => 6,
            Self::Monthly => 12,
        }
    }

    /// Distance between two consecutive bucket starts.
    pub fn increment(&self) -> CalendarOffset {
        match self {
            Self::Daily => CalendarOffset::days(1),
            Self::Weekly => CalendarOffset::weeks(1),
            Self::Monthly => CalendarOffset::months(1),
        }
    }

    /// Maps a wall-clock timestamp to the start of its bucket.
    ///
    /// Idempotent: `clamp(clamp(t)) == clamp(t)`.
    pub fn clamp(&self, ts: NaiveDateTime) -> NaiveDateTime {
        let date = ts.date();
        let start = match self {
            Self::Daily => date,
            Self::Weekly => {
                let since_monday = u64::from(date.weekday().num_days_from_monday());
                date.checked_sub_days(Days::new(since_monday))
                    .unwrap_or(NaiveDate::MIN)
            }
            Self::Monthly => date.with_day(1).unwrap_or(date),
        };
        start.and_time(NaiveTime::MIN)
    }

    /// Clamps an aware timestamp, keeping its time zone.
    pub fn clamp_in<Z: TimeZone>(&self, ts: &DateTime<Z>) -> DateTime<Z> {
        localize(&ts.timezone(), self.clamp(ts.naive_local()))
    }

    /// Places a window of `window_size` buckets relative to `reference`.
    ///
    /// Daily windows end at the start of the reference day, so the reference day itself is
    /// excluded. Weekly and monthly windows end at the start of the bucket after the reference,
    /// so the (possibly incomplete) current week or month is included.
    pub fn window_ending_at(
        &self,
        reference: NaiveDateTime,
        window_size: u32,
    ) -> PanelwiseResult<Bounds> {
        if window_size == 0 {
            return Err(ConfigError::InvalidWindowSize(window_size).into());
        }

        let start = self.clamp(reference);
        let latest = match self {
            Self::Daily => start,
            Self::Weekly | Self::Monthly => self.increment().add_to(start)?,
        };

        let span = self
            .increment()
            .checked_mul(window_size)
            .ok_or(ConfigError::InvalidWindowSize(window_size))?;
        let earliest = span.sub_from(latest)?;

        Bounds::new(earliest, latest)
    }

    /// Computes the window for `table`, anchored on the latest row that has an observed value in
    /// any of `columns`.
    pub fn bounds(
        &self,
        table: &TimeTable,
        columns: &[PlSmallStr],
        window_size: u32,
    ) -> PanelwiseResult<Bounds> {
        let reference = table.latest_observed(columns)?;
        self.window_ending_at(reference, window_size)
    }

    /// Tick label for a bucket start.
    pub fn bucket_label(&self, bucket: NaiveDateTime) -> String {
        let pattern = match self {
            Self::Daily => "%m/%d",
            Self::Weekly => "Wk\n%m/%d",
            Self::Monthly => "%b",
        };
        bucket.format(pattern).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};
    use strum::IntoEnumIterator;

    // ============================================================================================
    // Helper Functions
    // ============================================================================================

    fn at(year: i32, month: u32, day: u32, hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    fn midnight(year: i32, month: u32, day: u32) -> NaiveDateTime {
        at(year, month, day, 0, 0)
    }

    /// Every hour over a bit more than two years, crossing a leap day and month ends.
    fn sample_timestamps() -> impl Iterator<Item = NaiveDateTime> {
        let start = at(2022, 12, 25, 5, 17);
        (0..(24 * 800)).map(move |h| start + Duration::hours(h))
    }

    // ============================================================================================
    // Clamp
    // ============================================================================================

    #[test]
    fn daily_clamps_to_midnight() {
        assert_eq!(
            Granularity::Daily.clamp(at(2023, 7, 9, 12, 0)),
            midnight(2023, 7, 9)
        );
    }

    #[test]
    fn weekly_clamps_to_previous_monday() {
        // 2023-07-09 is a Sunday.
        assert_eq!(
            Granularity::Weekly.clamp(midnight(2023, 7, 9)),
            midnight(2023, 7, 3)
        );
        // Monday midnight maps to itself.
        assert_eq!(
            Granularity::Weekly.clamp(midnight(2023, 7, 3)),
            midnight(2023, 7, 3)
        );
        // Weeks straddle month and year ends.
        assert_eq!(
            Granularity::Weekly.clamp(at(2023, 1, 1, 23, 59)),
            midnight(2022, 12, 26)
        );
    }

    #[test]
    fn monthly_clamps_to_first_of_month() {
        assert_eq!(
            Granularity::Monthly.clamp(midnight(2023, 7, 9)),
            midnight(2023, 7, 1)
        );
        assert_eq!(
            Granularity::Monthly.clamp(at(2024, 2, 29, 18, 45)),
            midnight(2024, 2, 1)
        );
    }

    #[test]
    fn copied_granularity_clamps_a_single_timestamp() {
        let granularity = Granularity::Monthly;
        let starts = [at(2023, 7, 9, 12, 0), at(2023, 8, 31, 23, 59)]
            .into_iter()
            .map(|ts| granularity.clamp(ts))
            .collect::<Vec<_>>();
        assert_eq!(starts, vec![midnight(2023, 7, 1), midnight(2023, 8, 1)]);
    }

    #[test]
    fn clamp_is_idempotent() {
        for granularity in Granularity::iter() {
            for ts in sample_timestamps() {
                let once = granularity.clamp(ts);
                assert_eq!(granularity.clamp(once), once, "{granularity} at {ts}");
            }
        }
    }

    #[test]
    fn clamp_is_constant_within_a_bucket() {
        for granularity in Granularity::iter() {
            for ts in sample_timestamps() {
                let start = granularity.clamp(ts);
                let next = granularity.increment().add_to(start).unwrap();

                assert!(start <= ts && ts < next, "{granularity}: {ts} outside its bucket");
                assert_eq!(granularity.clamp(next - Duration::seconds(1)), start);
            }
        }
    }

    #[test]
    fn clamp_in_keeps_the_offset() {
        let offset = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let ts = offset.with_ymd_and_hms(2023, 7, 9, 2, 15, 0).unwrap();

        let clamped = Granularity::Weekly.clamp_in(&ts);

        assert_eq!(clamped.offset(), &offset);
        assert_eq!(clamped.naive_local(), midnight(2023, 7, 3));
    }

    #[test]
    fn clamp_in_uses_local_calendar_day() {
        let tz = chrono_tz::America::Los_Angeles;
        // 2023-07-01 03:00 UTC is still June 30th in Los Angeles.
        let ts = chrono::Utc
            .with_ymd_and_hms(2023, 7, 1, 3, 0, 0)
            .unwrap()
            .with_timezone(&tz);

        let clamped = Granularity::Monthly.clamp_in(&ts);

        assert_eq!(clamped.naive_local(), midnight(2023, 6, 1));
        assert_eq!(clamped.timezone(), tz);
    }

    // ============================================================================================
    // Windows
    // ============================================================================================

    #[test]
    fn monthly_window_includes_current_month() {
        let bounds = Granularity::Monthly
            .window_ending_at(midnight(2023, 7, 9), 13)
            .unwrap();
        assert_eq!(bounds.earliest(), midnight(2022, 7, 1));
        assert_eq!(bounds.latest(), midnight(2023, 8, 1));
    }

    #[test]
    fn weekly_window_includes_current_week() {
        let bounds = Granularity::Weekly
            .window_ending_at(midnight(2023, 7, 9), 3)
            .unwrap();
        assert_eq!(bounds.earliest(), midnight(2023, 6, 19));
        assert_eq!(bounds.latest(), midnight(2023, 7, 10));
    }

    #[test]
    fn daily_window_stops_before_reference_day() {
        let bounds = Granularity::Daily
            .window_ending_at(at(2023, 7, 9, 18, 30), 13)
            .unwrap();
        assert_eq!(bounds.earliest(), midnight(2023, 6, 26));
        assert_eq!(bounds.latest(), midnight(2023, 7, 9));
        assert!(!bounds.contains(at(2023, 7, 9, 18, 30)));
    }

    #[test]
    fn windows_are_never_empty() {
        for granularity in Granularity::iter() {
            for window in 1..=15 {
                for ts in sample_timestamps().step_by(97) {
                    let bounds = granularity.window_ending_at(ts, window).unwrap();
                    assert!(bounds.earliest() < bounds.latest());
                }
            }
        }
    }

    #[test]
    fn zero_window_is_a_config_error() {
        let err = Granularity::Weekly
            .window_ending_at(midnight(2023, 7, 9), 0)
            .unwrap_err();
        assert!(err.is_config());
    }

    // ============================================================================================
    // Labels & Parsing
    // ============================================================================================

    #[test]
    fn bucket_labels_follow_granularity() {
        let ts = midnight(2023, 7, 3);
        assert_eq!(Granularity::Daily.bucket_label(ts), "07/03");
        assert_eq!(Granularity::Weekly.bucket_label(ts), "Wk\n07/03");
        assert_eq!(Granularity::Monthly.bucket_label(ts), "Jul");
    }

    #[test]
    fn parses_from_snake_case() {
        assert_eq!("weekly".parse::<Granularity>().unwrap(), Granularity::Weekly);
        assert_eq!(Granularity::Monthly.to_string(), "monthly");
    }
}
