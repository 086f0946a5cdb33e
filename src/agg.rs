//! Per-bucket aggregation functions.
//!
//! An [`Aggregation`] is a named closure that turns the rows of one bucket into a single value.
//! Built-in constructors live in [`builtins`]; callers can wrap any reduction with
//! [`Aggregation::new`] or [`Aggregation::reduce`].

pub mod builtins;

use std::{fmt, sync::Arc};

use chrono::NaiveDateTime;
use polars::{frame::DataFrame, prelude::PlSmallStr};

use crate::{
    error::{AggregationError, PanelwiseResult},
    table::polars_ext::DataFrameExt,
};

/// Result of aggregating one bucket.
#[derive(Debug, Clone, PartialEq)]
pub enum AggValue {
    Scalar(Option<f64>),
    /// One value per column. Only rows of exactly one value can become a series point.
    Row(Vec<Option<f64>>),
}

impl AggValue {
    pub fn missing() -> Self {
        Self::Scalar(None)
    }

    /// Collapses the result to the single value plotted for the bucket.
    ///
    /// NaN is reported as missing.
    ///
    /// # Errors
    /// [`AggregationError::UnsupportedShape`] if a row result does not hold exactly one value.
    pub fn into_scalar(self, aggregation: &str, label: &str) -> PanelwiseResult<Option<f64>> {
        let value = match self {
            Self::Scalar(value) => value,
            Self::Row(values) => match values.as_slice() {
                [single] => *single,
                _ => {
                    return Err(AggregationError::UnsupportedShape {
                        aggregation: aggregation.to_string(),
                        label: label.to_string(),
                        width: values.len(),
                    }
                    .into());
                }
            },
        };
        Ok(value.filter(|v| !v.is_nan()))
    }
}

impl From<f64> for AggValue {
    fn from(value: f64) -> Self {
        Self::Scalar(Some(value))
    }
}

impl From<Option<f64>> for AggValue {
    fn from(value: Option<f64>) -> Self {
        Self::Scalar(value)
    }
}

type AggFn = dyn Fn(&Bucket<'_>) -> PanelwiseResult<AggValue> + Send + Sync;

/// A named, shareable aggregation function.
///
/// Cloning is cheap; the closure is reference counted so panels can be evaluated on several
/// threads at once.
#[derive(Clone)]
pub struct Aggregation {
    name: String,
    func: Arc<AggFn>,
}

impl Aggregation {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Bucket<'_>) -> PanelwiseResult<AggValue> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Lifts a reduction over plain values into an aggregation.
    ///
    /// The reduction runs once per series column on that column's observed values; a column
    /// without observations yields a missing value. A single-column series produces a scalar,
    /// anything wider produces a row.
    pub fn reduce<F>(name: impl Into<String>, reduction: F) -> Self
    where
        F: Fn(&[f64]) -> Option<f64> + Send + Sync + 'static,
    {
        Self::new(name, move |bucket| {
            let values = bucket
                .columns()
                .iter()
                .map(|column| -> PanelwiseResult<Option<f64>> {
                    let observed = bucket.values(column)?.into_iter().flatten().collect::<Vec<_>>();
                    Ok((!observed.is_empty())
                        .then(|| reduction(&observed))
                        .flatten())
                })
                .collect::<PanelwiseResult<Vec<_>>>()?;

            Ok(match values.as_slice() {
                [single] => AggValue::Scalar(*single),
                _ => AggValue::Row(values),
            })
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, bucket: &Bucket<'_>) -> PanelwiseResult<AggValue> {
        (self.func)(bucket)
    }
}

impl fmt::Debug for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregation")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Rows of one series that fall into the same bucket.
pub struct Bucket<'a> {
    start: NaiveDateTime,
    frame: DataFrame,
    timestamps: Vec<NaiveDateTime>,
    columns: &'a [PlSmallStr],
}

impl<'a> Bucket<'a> {
    pub(crate) fn new(
        start: NaiveDateTime,
        frame: DataFrame,
        timestamps: Vec<NaiveDateTime>,
        columns: &'a [PlSmallStr],
    ) -> Self {
        Self {
            start,
            frame,
            timestamps,
            columns,
        }
    }

    /// Bucket start, i.e. the clamped timestamp shared by all rows.
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// The bucket's rows: the (shifted) index column followed by the series columns.
    pub fn df(&self) -> &DataFrame {
        &self.frame
    }

    /// Wall-clock timestamps of the rows, after any offset was applied.
    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn columns(&self) -> &[PlSmallStr] {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Values of a series column as `f64`; nulls and NaNs are `None`.
    ///
    /// # Errors
    /// * [`AggregationError::MissingColumn`] if `column` is not one of the series' columns.
    /// * [`AggregationError::NonNumericColumn`] if the column is not numeric.
    pub fn values(&self, column: &str) -> PanelwiseResult<Vec<Option<f64>>> {
        if !self.columns.iter().any(|c| c.as_str() == column) {
            return Err(AggregationError::MissingColumn(column.to_string()).into());
        }
        self.frame.f64_values(column)
    }

    /// Observed values of `column` paired with their timestamps.
    pub fn observed(&self, column: &str) -> PanelwiseResult<Vec<(NaiveDateTime, f64)>> {
        Ok(self
            .timestamps
            .iter()
            .zip(self.values(column)?)
            .filter_map(|(ts, v)| v.map(|v| (*ts, v)))
            .collect())
    }
}
