use itertools::Itertools;
use ordered_float::OrderedFloat;
use polars::prelude::PlSmallStr;

use crate::{
    agg::{AggValue, Aggregation},
    error::{ConfigError, PanelwiseResult},
};

// ================================================================================================
// === Ratios & Rates ===
// ================================================================================================

/// `sum(numerator) / sum(denominator)` over the bucket.
///
/// Missing values are skipped. A zero denominator leaves the bucket undefined, so it is dropped
/// rather than reported as zero or infinity.
pub fn ratio(numerator: impl Into<PlSmallStr>, denominator: impl Into<PlSmallStr>) -> Aggregation {
    let numerator = numerator.into();
    let denominator = denominator.into();
    let name = format!("ratio({numerator}, {denominator})");

    Aggregation::new(name, move |bucket| {
        let num = bucket.values(&numerator)?.into_iter().flatten().sum::<f64>();
        let den = bucket.values(&denominator)?.into_iter().flatten().sum::<f64>();
        Ok(AggValue::Scalar((den != 0.0).then(|| num / den)))
    })
}

/// Sum of the observed values divided by the number of days they span.
///
/// The span is the number of whole days between the first and the last observed timestamp,
/// plus one. Observations less than a day apart therefore count as a single day, even when
/// they fall on different calendar dates.
pub fn average_per_day(column: impl Into<PlSmallStr>) -> Aggregation {
    let column = column.into();
    let name = format!("average_per_day({column})");

    Aggregation::new(name, move |bucket| {
        let observed = bucket.observed(&column)?;
        let Some((first, last)) = observed
            .iter()
            .map(|(ts, _)| *ts)
            .minmax()
            .into_option()
        else {
            return Ok(AggValue::missing());
        };

        let days = (last - first).num_days() + 1;
        let total = observed.iter().map(|(_, v)| v).sum::<f64>();
        Ok(AggValue::from(total / days as f64))
    })
}

// ================================================================================================
// === Distribution ===
// ================================================================================================

/// The `p`-th percentile (0..=100) of each series column, interpolating linearly between the
/// closest ranks.
///
/// # Errors
/// [`ConfigError::InvalidPercentile`] if `p` is not a finite value within `0..=100`.
pub fn percentile(p: f64) -> PanelwiseResult<Aggregation> {
    if !p.is_finite() || !(0.0..=100.0).contains(&p) {
        return Err(ConfigError::InvalidPercentile(p).into());
    }
    Ok(Aggregation::reduce(format!("percentile({p})"), move |values| {
        interpolated_percentile(values, p)
    }))
}

fn interpolated_percentile(values: &[f64], p: f64) -> Option<f64> {
    let sorted = values
        .iter()
        .copied()
        .map(OrderedFloat)
        .sorted_unstable()
        .map(OrderedFloat::into_inner)
        .collect::<Vec<_>>();

    let last = sorted.len().checked_sub(1)?;
    let rank = p / 100.0 * last as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

// ================================================================================================
// === Plain Reductions ===
// ================================================================================================

pub fn sum() -> Aggregation {
    Aggregation::reduce("sum", |values| Some(values.iter().sum()))
}

pub fn mean() -> Aggregation {
    Aggregation::reduce("mean", |values| {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    })
}

pub fn max() -> Aggregation {
    Aggregation::reduce("max", |values| values.iter().copied().reduce(f64::max))
}

pub fn min() -> Aggregation {
    Aggregation::reduce("min", |values| values.iter().copied().reduce(f64::min))
}

/// Number of observed values.
pub fn count() -> Aggregation {
    Aggregation::reduce("count", |values| Some(values.len() as f64))
}
