use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use polars::{
    frame::DataFrame,
    prelude::{Float64Chunked, IntoSeries, PlSmallStr},
};
use serde_json::Value;

use crate::{
    error::{ConfigError, PanelwiseResult},
    panel::pipeline::SeriesData,
    table::{
        index::IndexKind,
        polars_ext::{DataFrameExt, polars_err},
    },
    time::{bounds::Bounds, granularity::Granularity},
};

/// The aligned output of one panel.
///
/// The first column holds the bucket starts (same dtype as the input index), followed by one
/// `Float64` column per series in declaration order. A bucket a series has no value for is null.
#[derive(Debug, Clone)]
pub struct PanelTable {
    df: DataFrame,
    index: PlSmallStr,
    granularity: Granularity,
    bounds: Bounds,
    buckets: Vec<NaiveDateTime>,
    labels: Vec<PlSmallStr>,
}

impl PanelTable {
    /// Outer-joins the series on bucket start.
    pub(crate) fn assemble(
        kind: &IndexKind,
        index: PlSmallStr,
        granularity: Granularity,
        bounds: Bounds,
        series: Vec<SeriesData>,
    ) -> PanelwiseResult<Self> {
        let buckets = series
            .iter()
            .flat_map(|s| s.points.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();

        let mut df = kind.encode(index.clone(), &buckets)?.into_frame();
        let mut labels = Vec::with_capacity(series.len());

        for SeriesData { label, points } in series {
            if label == index {
                return Err(ConfigError::DuplicateLabel(label.to_string()).into());
            }
            let values = buckets
                .iter()
                .map(|bucket| points.get(bucket).copied())
                .collect::<Float64Chunked>()
                .with_name(label.clone());
            df.with_column(values.into_series())
                .map_err(|e| polars_err(&format!("Adding series '{label}'"), e))?;
            labels.push(label);
        }

        Ok(Self {
            df,
            index,
            granularity,
            bounds,
            buckets,
            labels,
        })
    }

    pub fn as_df(&self) -> &DataFrame {
        &self.df
    }

    pub fn into_df(self) -> DataFrame {
        self.df
    }

    pub fn index_name(&self) -> &PlSmallStr {
        &self.index
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Sorted bucket starts, one per row.
    pub fn buckets(&self) -> &[NaiveDateTime] {
        &self.buckets
    }

    /// Series labels in declaration order.
    pub fn labels(&self) -> &[PlSmallStr] {
        &self.labels
    }

    pub fn height(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Values of one series, aligned with [`PanelTable::buckets`].
    pub fn values(&self, label: &str) -> PanelwiseResult<Vec<Option<f64>>> {
        self.df.f64_values(label)
    }

    /// The value of `label` at `bucket`, if both exist and the value is defined.
    pub fn value(&self, label: &str, bucket: NaiveDateTime) -> Option<f64> {
        let row = self.buckets.binary_search(&bucket).ok()?;
        self.values(label).ok()?.get(row).copied().flatten()
    }

    /// Tick labels for the bucket column.
    pub fn bucket_labels(&self) -> Vec<String> {
        self.buckets
            .iter()
            .map(|bucket| self.granularity.bucket_label(*bucket))
            .collect()
    }

    pub fn to_json_rows(&self) -> PanelwiseResult<Vec<serde_json::Map<String, Value>>> {
        self.df.to_json_rows()
    }
}
