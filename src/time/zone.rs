use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

use crate::error::{ConfigError, PanelwiseResult};

/// Time zone attached to an aware time index.
///
/// Windowing always runs on wall-clock time in this zone, so a bucket that starts at local
/// midnight stays at local midnight when it is written back to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// An IANA zone such as `Europe/London`.
    Named(Tz),
    /// A fixed UTC offset such as `+01:00`.
    Fixed(FixedOffset),
}

impl Zone {
    pub fn parse(name: &str) -> PanelwiseResult<Self> {
        if let Ok(tz) = name.parse::<Tz>() {
            return Ok(Self::Named(tz));
        }
        name.parse::<FixedOffset>()
            .map(Self::Fixed)
            .map_err(|_| ConfigError::UnsupportedTimeZone(name.to_string()).into())
    }

    /// Converts a UTC instant to wall-clock time in this zone.
    pub fn to_local(&self, utc: NaiveDateTime) -> NaiveDateTime {
        match self {
            Self::Named(tz) => tz.from_utc_datetime(&utc).naive_local(),
            Self::Fixed(offset) => offset.from_utc_datetime(&utc).naive_local(),
        }
    }

    /// Converts wall-clock time in this zone back to a UTC instant.
    pub fn to_utc(&self, local: NaiveDateTime) -> NaiveDateTime {
        match self {
            Self::Named(tz) => localize(tz, local).naive_utc(),
            Self::Fixed(offset) => localize(offset, local).naive_utc(),
        }
    }
}

/// Attaches `tz` to a wall-clock time.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant. Times skipped by a DST
/// jump resolve to the first valid instant after the gap.
pub(crate) fn localize<Z: TimeZone>(tz: &Z, local: NaiveDateTime) -> DateTime<Z> {
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
        .unwrap_or_else(|| tz.from_utc_datetime(&local))
}
