//! Automatic panel layout for charts built without explicit panels.
//!
//! Every numeric column becomes a `sum` series with its own line style, and the panel set is
//! chosen from how many days the table spans.

use strum::{EnumCount, IntoEnumIterator};

use crate::{
    agg::builtins::sum,
    error::{ConfigError, DataError, PanelwiseResult},
    panel::Panel,
    series::{LineStyle, SeriesSpec, SeriesStyle},
    table::TimeTable,
    time::granularity::Granularity,
};

/// `(granularity, window size)` pairs for a table spanning `span_days` whole days.
///
/// | span          | panels                                  |
/// |---------------|-----------------------------------------|
/// | < 14          | Daily(span)                             |
/// | 14 ..< 31     | Daily(7), Weekly(4)                     |
/// | 31 ..< 365    | Daily(7), Weekly(6)                     |
/// | ≥ 365         | Daily(7), Weekly(6), Monthly(12)        |
///
/// A table covering a single day still gets a one-day window.
pub fn layout(span_days: i64) -> Vec<(Granularity, u32)> {
    match span_days {
        ..14 => {
            let days = u32::try_from(span_days).unwrap_or(0);
            if days == 0 {
                tracing::warn!(span_days, "Table spans less than a day; using a one-day window");
            }
            vec![(Granularity::Daily, days.max(1))]
        }
        14..31 => vec![(Granularity::Daily, 7), (Granularity::Weekly, 4)],
        31..365 => vec![(Granularity::Daily, 7), (Granularity::Weekly, 6)],
        _ => vec![
            (Granularity::Daily, 7),
            (Granularity::Weekly, 6),
            (Granularity::Monthly, 12),
        ],
    }
}

/// One `sum` series per numeric column, each with the next line style.
///
/// # Errors
/// * [`ConfigError::NoNumericColumns`] if the table has no numeric column besides its index.
/// * [`ConfigError::TooManyNumericColumns`] if there are more columns than line styles.
pub fn default_series(table: &TimeTable) -> PanelwiseResult<Vec<SeriesSpec>> {
    let columns = table.numeric_columns();
    if columns.is_empty() {
        return Err(ConfigError::NoNumericColumns.into());
    }
    if columns.len() > LineStyle::COUNT {
        return Err(ConfigError::TooManyNumericColumns {
            found: columns.len(),
            available: LineStyle::COUNT,
        }
        .into());
    }

    Ok(columns
        .into_iter()
        .zip(LineStyle::iter())
        .map(|(column, line_style)| {
            SeriesSpec::new([column.clone()], column, sum())
                .with_style(SeriesStyle::default().with_line_style(line_style))
        })
        .collect())
}

/// Panels for a chart without an explicit panel list.
///
/// The time index was already validated when the [`TimeTable`] was built.
pub(crate) fn auto_panels(table: &TimeTable) -> PanelwiseResult<Vec<Panel>> {
    let series = default_series(table)?;
    let span_days = table.span_days().ok_or_else(|| {
        DataError::NoObservations(series.iter().map(|s| s.label().to_string()).collect())
    })?;

    let layout = layout(span_days);
    tracing::debug!(span_days, panels = layout.len(), "Selected automatic panel layout");

    layout
        .into_iter()
        .map(|(granularity, window)| Panel::new(granularity, series.clone(), window))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use polars::prelude::{DataFrame, NamedFrom, df};

    fn table(days: i64, columns: usize) -> TimeTable {
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let index = (0..days)
            .map(|i| start + Duration::days(i))
            .collect::<Vec<_>>();
        let mut df: DataFrame = df!["day" => index, "label" => vec!["x"; days as usize]].unwrap();
        for c in 0..columns {
            let values = (0..days).map(|i| (i as f64) * (c as f64 + 1.0)).collect::<Vec<_>>();
            df.with_column(polars::prelude::Series::new(format!("c{c}").into(), values))
                .unwrap();
        }
        TimeTable::new(df, "day").unwrap()
    }

    #[test]
    fn layout_follows_span_thresholds() {
        use Granularity::*;

        assert_eq!(layout(0), vec![(Daily, 1)]);
        assert_eq!(layout(9), vec![(Daily, 9)]);
        assert_eq!(layout(13), vec![(Daily, 13)]);
        assert_eq!(layout(14), vec![(Daily, 7), (Weekly, 4)]);
        assert_eq!(layout(30), vec![(Daily, 7), (Weekly, 4)]);
        assert_eq!(layout(31), vec![(Daily, 7), (Weekly, 6)]);
        assert_eq!(layout(364), vec![(Daily, 7), (Weekly, 6)]);
        assert_eq!(layout(365), vec![(Daily, 7), (Weekly, 6), (Monthly, 12)]);
    }

    #[test]
    fn numeric_columns_become_styled_sum_series() {
        let series = default_series(&table(20, 3)).unwrap();

        let labels = series.iter().map(|s| s.label().as_str()).collect::<Vec<_>>();
        assert_eq!(labels, vec!["c0", "c1", "c2"]);

        let styles = series
            .iter()
            .map(|s| s.style().line_style)
            .collect::<Vec<_>>();
        assert_eq!(
            styles,
            vec![LineStyle::Solid, LineStyle::Dashed, LineStyle::DashDot]
        );
        assert!(series.iter().all(|s| s.aggregation().name() == "sum"));
    }

    #[test]
    fn column_count_is_bounded_by_line_styles() {
        assert!(default_series(&table(20, 0)).unwrap_err().is_config());
        assert!(default_series(&table(20, 5)).unwrap_err().is_config());
        assert!(default_series(&table(20, 4)).is_ok());
    }

    #[test]
    fn auto_panels_use_table_span() {
        // 2022-01-01 ..= 2023-01-01 spans 365 days.
        let panels = auto_panels(&table(366, 1)).unwrap();
        let granularities = panels.iter().map(Panel::granularity).collect::<Vec<_>>();
        assert_eq!(
            granularities,
            vec![Granularity::Daily, Granularity::Weekly, Granularity::Monthly]
        );
    }
}
