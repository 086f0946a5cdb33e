use std::{borrow::Cow, collections::BTreeMap};

use chrono::NaiveDateTime;
use polars::prelude::{IdxCa, IdxSize, NewChunkedArray, PlSmallStr};

use crate::{
    agg::Bucket,
    error::{DataError, PanelwiseResult},
    series::SeriesSpec,
    table::{TimeTable, polars_ext::polars_err},
    time::{bounds::Bounds, granularity::Granularity},
};

/// Aggregated points of one series, keyed by bucket start. Undefined buckets are absent.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SeriesData {
    pub(crate) label: PlSmallStr,
    pub(crate) points: BTreeMap<NaiveDateTime, f64>,
}

/// Runs one series through shift, filter, bucket, aggregate and drop.
///
/// The caller's frame is never modified; shifted timestamps live in a copy of the selected
/// columns.
pub(crate) fn aggregate_series(
    table: &TimeTable,
    granularity: Granularity,
    bounds: &Bounds,
    series: &SeriesSpec,
) -> PanelwiseResult<SeriesData> {
    if let Some(missing) = series.columns().iter().find(|c| !table.has_column(c)) {
        return Err(DataError::ColumnNotFound(missing.to_string()).into());
    }

    let timestamps = shifted_timestamps(table, series)?;
    let buckets = bucket_rows(&timestamps, granularity, bounds);

    let index = table.index_name();
    let mut frame = table
        .as_df()
        .select(std::iter::once(index.clone()).chain(series.columns().iter().cloned()))
        .map_err(|e| polars_err("Selecting series columns", e))?;
    if series.offset().is_some() {
        let shifted = table.index_kind().encode(index.clone(), &timestamps)?;
        frame
            .with_column(shifted)
            .map_err(|e| polars_err("Replacing index with shifted timestamps", e))?;
    }

    let aggregation = series.aggregation();
    let mut points = BTreeMap::new();

    for (start, rows) in buckets {
        let row_timestamps = rows.iter().map(|&row| timestamps[row as usize]).collect();
        let rows = IdxCa::from_vec(PlSmallStr::EMPTY, rows);
        let rows = frame
            .take(&rows)
            .map_err(|e| polars_err("Gathering bucket rows", e))?;

        let bucket = Bucket::new(start, rows, row_timestamps, series.columns());
        let value = aggregation
            .apply(&bucket)?
            .into_scalar(aggregation.name(), series.label())?;

        match value {
            Some(value) => {
                points.insert(start, value);
            }
            None => tracing::trace!(
                label = %series.label(),
                bucket = %start,
                rows = bucket.len(),
                "Dropping undefined bucket"
            ),
        }
    }

    Ok(SeriesData {
        label: series.label().clone(),
        points,
    })
}

fn shifted_timestamps<'a>(
    table: &'a TimeTable,
    series: &SeriesSpec,
) -> PanelwiseResult<Cow<'a, [NaiveDateTime]>> {
    let Some(offset) = series.offset() else {
        return Ok(Cow::Borrowed(table.timestamps()));
    };

    table
        .timestamps()
        .iter()
        .map(|ts| offset.add_to(*ts))
        .collect::<PanelwiseResult<Vec<_>>>()
        .map(Cow::Owned)
}

/// Row positions inside `bounds`, grouped by bucket start in ascending order.
fn bucket_rows(
    timestamps: &[NaiveDateTime],
    granularity: Granularity,
    bounds: &Bounds,
) -> BTreeMap<NaiveDateTime, Vec<IdxSize>> {
    let mut buckets: BTreeMap<NaiveDateTime, Vec<IdxSize>> = BTreeMap::new();
    for (row, ts) in timestamps.iter().enumerate() {
        if bounds.contains(*ts) {
            buckets
                .entry(granularity.clamp(*ts))
                .or_default()
                .push(row as IdxSize);
        }
    }
    buckets
}
