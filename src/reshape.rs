//! Reshaping helpers for preparing raw tables.

use chrono::{Duration, NaiveDateTime};
use polars::{
    frame::DataFrame,
    prelude::{Float64Chunked, IdxCa, IdxSize, IntoSeries, NewChunkedArray, PlSmallStr},
};

use crate::{
    error::{DataError, PanelwiseResult},
    table::{
        index::IndexKind,
        polars_ext::{DataFrameExt, polars_err},
    },
    time::{granularity::Granularity, offset::CalendarOffset},
};

/// Spreads monthly totals evenly over the days of each month.
///
/// Every row is repeated once per day from its `month_column` timestamp up to the same time one
/// month later. The repeated rows get a `day_column` with the day's timestamp (same dtype as the
/// month column) and `value_column` divided by the number of days in that calendar month. The
/// month column is dropped; every other column is repeated unchanged.
///
/// # Errors
/// * [`DataError::ColumnNotFound`] if either input column is missing.
/// * [`crate::error::ConfigError::InvalidIndex`] if the month column is not a date or datetime.
/// * [`crate::error::AggregationError::NonNumericColumn`] if the value column is not numeric.
pub fn split_month_by_day(
    df: &DataFrame,
    value_column: &str,
    month_column: &str,
    day_column: &str,
) -> PanelwiseResult<DataFrame> {
    let month = df
        .column(month_column)
        .map_err(|_| DataError::ColumnNotFound(month_column.to_string()))?;
    let kind = IndexKind::from_dtype(month_column, month.dtype())?;
    let months = kind.decode(month)?;
    let values = df.f64_values(value_column)?;

    let mut rows: Vec<IdxSize> = Vec::new();
    let mut days: Vec<NaiveDateTime> = Vec::new();
    let mut split: Vec<Option<f64>> = Vec::new();

    for (row, (start, value)) in months.into_iter().zip(values).enumerate() {
        let end = CalendarOffset::months(1).add_to(start)?;
        let days_in_month = days_in_month(start)?;

        let mut day = start;
        while day < end {
            rows.push(row as IdxSize);
            days.push(day);
            split.push(value.map(|v| v / days_in_month as f64));
            day += Duration::days(1);
        }
    }

    let mut out = df
        .drop(month_column)
        .map_err(|e| polars_err("Dropping month column", e))?
        .take(&IdxCa::from_vec(PlSmallStr::EMPTY, rows))
        .map_err(|e| polars_err("Repeating rows per day", e))?;

    out.with_column(kind.encode(day_column.into(), &days)?)
        .map_err(|e| polars_err("Adding day column", e))?;
    let split = split
        .into_iter()
        .collect::<Float64Chunked>()
        .with_name(value_column.into());
    out.with_column(split.into_series())
        .map_err(|e| polars_err("Replacing value column", e))?;

    Ok(out)
}

fn days_in_month(ts: NaiveDateTime) -> PanelwiseResult<i64> {
    let first = Granularity::Monthly.clamp(ts);
    let next = CalendarOffset::months(1).add_to(first)?;
    Ok((next - first).num_days())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use polars::prelude::{DataType, df};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn spreads_each_month_over_its_days() {
        let df = df![
            "month" => &[date(2024, 2, 1), date(2023, 4, 1)],
            "cost" => &[Some(290.0), None],
            "team" => &["core", "web"],
        ]
        .unwrap();

        let out = split_month_by_day(&df, "cost", "month", "day").unwrap();

        // 29 days in February 2024, 30 in April 2023.
        assert_eq!(out.height(), 59);
        assert_eq!(out.get_column_names_str(), vec!["cost", "team", "day"]);
        assert_eq!(out.column("day").unwrap().dtype(), &DataType::Date);

        let cost = out.f64_values("cost").unwrap();
        assert!(cost[..29].iter().all(|v| *v == Some(10.0)));
        assert!(cost[29..].iter().all(Option::is_none));

        let days = IndexKind::Date.decode(out.column("day").unwrap()).unwrap();
        assert_eq!(days[0].date(), date(2024, 2, 1));
        assert_eq!(days[28].date(), date(2024, 2, 29));
        assert_eq!(days[29].date(), date(2023, 4, 1));
    }

    #[test]
    fn missing_columns_are_reported() {
        let df = df![
            "month" => &[date(2024, 2, 1)],
            "cost" => &[1.0],
        ]
        .unwrap();

        assert!(split_month_by_day(&df, "cost", "nope", "day").unwrap_err().is_data());
        assert!(split_month_by_day(&df, "nope", "month", "day").unwrap_err().is_data());
    }
}
