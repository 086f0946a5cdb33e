use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::{
    Column, DataType, Int32Chunked, Int64Chunked, IntoSeries, NewChunkedArray, PlSmallStr, Series,
    TimeUnit, TimeZone as PlTimeZone,
};

use crate::{
    error::{ConfigError, DataError, PanelwiseResult},
    table::polars_ext::polars_err,
    time::zone::Zone,
};

/// Days from 0001-01-01 (CE) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Physical encoding of a time index column.
///
/// Timestamps are decoded into wall-clock [`NaiveDateTime`] values (in the column's own zone for
/// aware columns) and encoded back with exactly the same dtype, unit and zone.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexKind {
    Date,
    Datetime {
        unit: TimeUnit,
        time_zone: Option<PlTimeZone>,
        zone: Option<Zone>,
    },
}

impl IndexKind {
    pub fn from_dtype(column: &str, dtype: &DataType) -> PanelwiseResult<Self> {
        match dtype {
            DataType::Date => Ok(Self::Date),
            DataType::Datetime(unit, time_zone) => {
                let zone = time_zone
                    .as_ref()
                    .map(|tz| Zone::parse(tz.as_str()))
                    .transpose()?;
                Ok(Self::Datetime {
                    unit: *unit,
                    time_zone: time_zone.clone(),
                    zone,
                })
            }
            other => Err(ConfigError::InvalidIndex {
                column: column.to_string(),
                dtype: other.to_string(),
            }
            .into()),
        }
    }

    /// `true` when the index carries a time zone.
    pub fn is_aware(&self) -> bool {
        self.zone().is_some()
    }

    pub fn zone(&self) -> Option<Zone> {
        match self {
            Self::Date => None,
            Self::Datetime { zone, .. } => *zone,
        }
    }

    pub fn dtype(&self) -> DataType {
        match self {
            Self::Date => DataType::Date,
            Self::Datetime {
                unit, time_zone, ..
            } => DataType::Datetime(*unit, time_zone.clone()),
        }
    }

    /// Decodes `column` into wall-clock timestamps, one per row.
    ///
    /// # Errors
    /// * [`ConfigError::NullTimestamp`] if any row has no timestamp.
    /// * [`DataError::TimestampOverflow`] if a value is outside chrono's range.
    pub fn decode(&self, column: &Column) -> PanelwiseResult<Vec<NaiveDateTime>> {
        let name = column.name().as_str();
        let null_at = |row: usize| ConfigError::NullTimestamp {
            column: name.to_string(),
            row,
        };

        match self {
            Self::Date => {
                let ca = column.date().map_err(|e| polars_err("Decoding date index", e))?;
                ca.physical()
                    .into_iter()
                    .enumerate()
                    .map(|(row, days)| -> PanelwiseResult<NaiveDateTime> {
                        let days = days.ok_or_else(|| null_at(row))?;
                        days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
                            .and_then(NaiveDate::from_num_days_from_ce_opt)
                            .map(|d| d.and_time(NaiveTime::MIN))
                            .ok_or_else(|| {
                                DataError::TimestampOverflow(format!("{days} days since epoch"))
                                    .into()
                            })
                    })
                    .collect()
            }
            Self::Datetime { unit, zone, .. } => {
                let ca = column
                    .datetime()
                    .map_err(|e| polars_err("Decoding datetime index", e))?;
                ca.physical()
                    .into_iter()
                    .enumerate()
                    .map(|(row, value)| -> PanelwiseResult<NaiveDateTime> {
                        let value = value.ok_or_else(|| null_at(row))?;
                        let utc = from_physical(value, *unit).ok_or_else(|| {
                            DataError::TimestampOverflow(format!("{value} ({unit:?})"))
                        })?;
                        Ok(match zone {
                            Some(zone) => zone.to_local(utc),
                            None => utc,
                        })
                    })
                    .collect()
            }
        }
    }

    /// Encodes wall-clock timestamps into a series with this index's dtype.
    pub fn encode(&self, name: PlSmallStr, values: &[NaiveDateTime]) -> PanelwiseResult<Series> {
        match self {
            Self::Date => {
                let days = values
                    .iter()
                    .map(|ts| ts.date().num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
                    .collect::<Vec<_>>();
                Ok(Int32Chunked::from_vec(name, days).into_date().into_series())
            }
            Self::Datetime {
                unit,
                time_zone,
                zone,
            } => {
                let physical = values
                    .iter()
                    .map(|ts| -> PanelwiseResult<i64> {
                        let utc = match zone {
                            Some(zone) => zone.to_utc(*ts),
                            None => *ts,
                        };
                        to_physical(utc, *unit).ok_or_else(|| {
                            DataError::TimestampOverflow(format!("{ts} as {unit:?}")).into()
                        })
                    })
                    .collect::<PanelwiseResult<Vec<_>>>()?;
                Ok(Int64Chunked::from_vec(name, physical)
                    .into_datetime(*unit, time_zone.clone())
                    .into_series())
            }
        }
    }
}

fn units_per_second(unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Nanoseconds => NANOS_PER_SECOND,
        TimeUnit::Microseconds => 1_000_000,
        TimeUnit::Milliseconds => 1_000,
    }
}

fn from_physical(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let per_second = units_per_second(unit);
    let secs = value.div_euclid(per_second);
    let nanos = value.rem_euclid(per_second) * (NANOS_PER_SECOND / per_second);
    DateTime::from_timestamp(secs, u32::try_from(nanos).ok()?).map(|ts| ts.naive_utc())
}

fn to_physical(ts: NaiveDateTime, unit: TimeUnit) -> Option<i64> {
    let utc = ts.and_utc();
    let per_second = units_per_second(unit);
    let sub_second = i64::from(utc.timestamp_subsec_nanos()) / (NANOS_PER_SECOND / per_second);
    utc.timestamp()
        .checked_mul(per_second)?
        .checked_add(sub_second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::IntoColumn;

    fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn rejects_non_temporal_dtypes() {
        let err = IndexKind::from_dtype("day", &DataType::Int64).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn physical_conversion_handles_pre_epoch_values() {
        let ts = NaiveDate::from_ymd_opt(1969, 12, 31)
            .unwrap()
            .and_hms_milli_opt(23, 59, 59, 500)
            .unwrap();

        for unit in [
            TimeUnit::Milliseconds,
            TimeUnit::Microseconds,
            TimeUnit::Nanoseconds,
        ] {
            let physical = to_physical(ts, unit).unwrap();
            assert!(physical < 0);
            assert_eq!(from_physical(physical, unit), Some(ts), "{unit:?}");
        }
    }

    #[test]
    fn date_index_decodes_to_midnight() {
        let kind = IndexKind::Date;
        let values = vec![at(2023, 7, 9, 0), at(1969, 7, 20, 0)];
        let column = kind.encode("day".into(), &values).unwrap().into_column();

        assert_eq!(column.dtype(), &DataType::Date);
        assert_eq!(kind.decode(&column).unwrap(), values);
    }

    #[test]
    fn utc_index_keeps_dtype() {
        let kind = IndexKind::from_dtype(
            "ts",
            &DataType::Datetime(TimeUnit::Microseconds, Some(PlTimeZone::UTC)),
        )
        .unwrap();
        assert!(kind.is_aware());

        let values = vec![at(2023, 7, 9, 12), at(2023, 7, 10, 1)];
        let column = kind.encode("ts".into(), &values).unwrap().into_column();

        assert_eq!(column.dtype(), &kind.dtype());
        assert_eq!(kind.decode(&column).unwrap(), values);
    }

    #[test]
    fn null_timestamps_are_rejected() {
        let column = Int64Chunked::from_slice_options("ts".into(), &[Some(0), None])
            .into_datetime(TimeUnit::Milliseconds, None)
            .into_series()
            .into_column();
        let kind = IndexKind::from_dtype("ts", column.dtype()).unwrap();

        let err = kind.decode(&column).unwrap_err();
        assert!(err.is_config());
    }
}
