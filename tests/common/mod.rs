#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use panelwise::prelude::*;
use polars::prelude::{DataFrame, df};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn midnight(year: i32, month: u32, day: u32) -> NaiveDateTime {
    date(year, month, day).and_hms_opt(0, 0, 0).unwrap()
}

/// Every day from `first` through `last`, both inclusive.
pub fn days_between(first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    first.iter_days().take_while(|d| *d <= last).collect()
}

/// Daily request counts from 2021-07-01 through 2023-07-09.
///
/// Every day has 100 requests of which 99 succeed, and `one` is always `1.0`.
pub fn setup_reliability_table() -> TimeTable {
    let days = days_between(date(2021, 7, 1), date(2023, 7, 9));
    let n = days.len();
    let df: DataFrame = df![
        "day" => days,
        "num_valid" => vec![99i64; n],
        "total_num" => vec![100i64; n],
        "one" => vec![1.0; n],
    ]
    .unwrap();
    TimeTable::new(df, "day").unwrap()
}

/// Daily rows for the first quarter of 2023.
///
/// `full` is `3.0` on every row; `na` is `3.0` for the first 45 rows and missing afterwards.
pub fn setup_quarter_table() -> TimeTable {
    let days = days_between(date(2023, 1, 1), date(2023, 3, 31));
    let full = days.iter().map(|_| 3.0).collect::<Vec<_>>();
    let na = (0..days.len())
        .map(|i| (i < 45).then_some(3.0))
        .collect::<Vec<_>>();
    let df: DataFrame = df!["day" => days, "full" => full, "na" => na].unwrap();
    TimeTable::new(df, "day").unwrap()
}

/// Hourly-stamped rows at noon for `days` days starting 2023-06-01, with `value` counting up.
pub fn setup_noon_table(days: i64) -> TimeTable {
    let stamps = (0..days)
        .map(|i| midnight(2023, 6, 1) + Duration::days(i) + Duration::hours(12))
        .collect::<Vec<_>>();
    let values = (0..days).map(|i| i as f64).collect::<Vec<_>>();
    let df: DataFrame = df!["ts" => stamps, "value" => values].unwrap();
    TimeTable::new(df, "ts").unwrap()
}
