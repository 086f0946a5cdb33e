//! The raw, time-indexed input table.

pub mod index;
pub mod polars_ext;

use chrono::NaiveDateTime;
use itertools::Itertools;
use polars::{frame::DataFrame, prelude::PlSmallStr};

use crate::{
    error::{DataError, PanelwiseResult},
    table::{
        index::IndexKind,
        polars_ext::{DataFrameExt, is_numeric},
    },
};

/// A data frame together with the column that indexes its rows in time.
///
/// The index is validated and decoded once on construction. The frame itself is never
/// modified; every derived table is built from a copy.
#[derive(Debug, Clone)]
pub struct TimeTable {
    df: DataFrame,
    index: PlSmallStr,
    kind: IndexKind,
    timestamps: Vec<NaiveDateTime>,
}

impl TimeTable {
    /// Wraps `df`, using `index` as its time index.
    ///
    /// # Errors
    /// * [`DataError::ColumnNotFound`] if `index` is not a column of `df`.
    /// * [`crate::error::ConfigError::InvalidIndex`] if the column is not a `Date` or `Datetime`.
    /// * [`crate::error::ConfigError::NullTimestamp`] if any row has no timestamp.
    pub fn new(df: DataFrame, index: impl Into<PlSmallStr>) -> PanelwiseResult<Self> {
        let index = index.into();
        let column = df
            .column(index.as_str())
            .map_err(|_| DataError::ColumnNotFound(index.to_string()))?;

        let kind = IndexKind::from_dtype(index.as_str(), column.dtype())?;
        let timestamps = kind.decode(column)?;

        Ok(Self {
            df,
            index,
            kind,
            timestamps,
        })
    }

    pub fn as_df(&self) -> &DataFrame {
        &self.df
    }

    pub fn index_name(&self) -> &PlSmallStr {
        &self.index
    }

    pub fn index_kind(&self) -> &IndexKind {
        &self.kind
    }

    /// Wall-clock timestamps, one per row, in row order.
    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn height(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.get_column_index(name).is_some()
    }

    /// Earliest and latest timestamps of the index.
    pub fn time_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        self.timestamps.iter().copied().minmax().into_option()
    }

    /// Whole days between the earliest and latest timestamp.
    pub fn span_days(&self) -> Option<i64> {
        self.time_range()
            .map(|(first, last)| (last - first).num_days())
    }

    /// Numeric columns other than the index, in frame order.
    pub fn numeric_columns(&self) -> Vec<PlSmallStr> {
        self.df
            .get_columns()
            .iter()
            .filter(|c| c.name() != &self.index && is_numeric(c.dtype()))
            .map(|c| c.name().clone())
            .collect()
    }

    /// Latest timestamp among rows that have an observed value in at least one of `columns`.
    ///
    /// Trailing rows where every relevant column is missing do not move the reference.
    ///
    /// # Errors
    /// * [`DataError::ColumnNotFound`] if a column does not exist.
    /// * [`DataError::NoObservations`] if no row has an observed value.
    pub fn latest_observed(&self, columns: &[PlSmallStr]) -> PanelwiseResult<NaiveDateTime> {
        let mut observed = vec![false; self.height()];
        for column in columns {
            let mask = self.df.observed_mask(column.as_str())?;
            observed
                .iter_mut()
                .zip(mask)
                .for_each(|(acc, seen)| *acc |= seen);
        }

        self.timestamps
            .iter()
            .zip(observed)
            .filter_map(|(ts, seen)| seen.then_some(*ts))
            .max()
            .ok_or_else(|| {
                DataError::NoObservations(columns.iter().map(ToString::to_string).collect()).into()
            })
    }
}
