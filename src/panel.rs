//! A panel: one granularity, a set of series, and the window they are evaluated over.

pub(crate) mod pipeline;
pub mod table;

use std::collections::HashSet;

use itertools::Itertools;
use polars::prelude::PlSmallStr;

use crate::{
    error::{ConfigError, PanelwiseResult},
    panel::{pipeline::aggregate_series, table::PanelTable},
    series::SeriesSpec,
    table::TimeTable,
    time::{bounds::Bounds, granularity::Granularity},
};

/// One sub-plot of a chart.
///
/// A panel is validated once on construction and is immutable afterwards. Its output is
/// recomputed from the raw table on every call to [`Panel::data`].
#[derive(Debug, Clone)]
pub struct Panel {
    granularity: Granularity,
    series: Vec<SeriesSpec>,
    window_size: u32,
    range_columns: Option<Vec<PlSmallStr>>,
}

impl Panel {
    /// # Errors
    /// * [`ConfigError::NoSeries`] if `series` is empty.
    /// * [`ConfigError::EmptySeriesColumns`] if a series references no column.
    /// * [`ConfigError::DuplicateLabel`] if two series share a label.
    /// * [`ConfigError::NoAnchorSeries`] if every series carries an offset.
    /// * [`ConfigError::InvalidWindowSize`] if `window_size` is zero.
    pub fn new(
        granularity: Granularity,
        series: Vec<SeriesSpec>,
        window_size: u32,
    ) -> PanelwiseResult<Self> {
        if series.is_empty() {
            return Err(ConfigError::NoSeries.into());
        }
        if let Some(empty) = series.iter().find(|s| s.columns().is_empty()) {
            return Err(ConfigError::EmptySeriesColumns(empty.label().to_string()).into());
        }

        let mut seen = HashSet::with_capacity(series.len());
        if let Some(duplicate) = series.iter().find(|s| !seen.insert(s.label())) {
            return Err(ConfigError::DuplicateLabel(duplicate.label().to_string()).into());
        }

        if !series.iter().any(SeriesSpec::is_anchor) {
            return Err(ConfigError::NoAnchorSeries {
                labels: series.iter().map(|s| s.label().to_string()).collect(),
            }
            .into());
        }
        if window_size == 0 {
            return Err(ConfigError::InvalidWindowSize(window_size).into());
        }

        Ok(Self {
            granularity,
            series,
            window_size,
            range_columns: None,
        })
    }

    /// Panel with the granularity's default window (7 days, 6 weeks or 12 months).
    pub fn with_default_window(
        granularity: Granularity,
        series: Vec<SeriesSpec>,
    ) -> PanelwiseResult<Self> {
        Self::new(granularity, series, granularity.default_window())
    }

    pub fn daily(series: Vec<SeriesSpec>, window_size: u32) -> PanelwiseResult<Self> {
        Self::new(Granularity::Daily, series, window_size)
    }

    pub fn weekly(series: Vec<SeriesSpec>, window_size: u32) -> PanelwiseResult<Self> {
        Self::new(Granularity::Weekly, series, window_size)
    }

    pub fn monthly(series: Vec<SeriesSpec>, window_size: u32) -> PanelwiseResult<Self> {
        Self::new(Granularity::Monthly, series, window_size)
    }

    /// Anchors the window on these columns instead of the union of all series' columns.
    ///
    /// An empty list restores the default.
    pub fn with_range_columns<I>(self, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<PlSmallStr>,
    {
        let columns = columns
            .into_iter()
            .map(Into::into)
            .unique()
            .collect::<Vec<_>>();
        Self {
            range_columns: (!columns.is_empty()).then_some(columns),
            ..self
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn series(&self) -> &[SeriesSpec] {
        &self.series
    }

    pub fn window_size(&self) -> u32 {
        self.window_size
    }

    pub fn range_columns(&self) -> Option<&[PlSmallStr]> {
        self.range_columns.as_deref()
    }

    /// Columns whose observations place the window.
    pub fn relevant_columns(&self) -> Vec<PlSmallStr> {
        match &self.range_columns {
            Some(columns) => columns.clone(),
            None => self
                .series
                .iter()
                .flat_map(|s| s.columns().iter().cloned())
                .unique()
                .collect(),
        }
    }

    pub fn bounds(&self, table: &TimeTable) -> PanelwiseResult<Bounds> {
        self.granularity
            .bounds(table, &self.relevant_columns(), self.window_size)
    }

    /// Computes the panel's aligned table from `table`.
    ///
    /// Either every series succeeds or the whole panel fails.
    #[tracing::instrument(
        name = "panel_data",
        skip(self, table),
        fields(granularity = %self.granularity, window = self.window_size)
    )]
    pub fn data(&self, table: &TimeTable) -> PanelwiseResult<PanelTable> {
        let bounds = self.bounds(table)?;
        tracing::debug!(%bounds, "Computed panel bounds");

        let series = self
            .series
            .iter()
            .map(|spec| aggregate_series(table, self.granularity, &bounds, spec))
            .collect::<PanelwiseResult<Vec<_>>>()?;

        let panel = PanelTable::assemble(
            table.index_kind(),
            table.index_name().clone(),
            self.granularity,
            bounds,
            series,
        )?;
        tracing::debug!(
            buckets = panel.height(),
            series = panel.labels().len(),
            "Assembled panel table"
        );
        Ok(panel)
    }
}
