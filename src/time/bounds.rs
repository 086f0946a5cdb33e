use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::error::{DataError, PanelwiseResult};

/// The half-open window `[earliest, latest)` a panel is evaluated over.
///
/// Both ends are wall-clock times in the zone of the time index they were derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Bounds {
    earliest: NaiveDateTime,
    latest: NaiveDateTime,
}

impl Bounds {
    /// # Errors
    /// Returns [`DataError::InvalidBounds`] unless `earliest < latest`.
    pub fn new(earliest: NaiveDateTime, latest: NaiveDateTime) -> PanelwiseResult<Self> {
        if earliest >= latest {
            return Err(DataError::InvalidBounds {
                earliest: earliest.to_string(),
                latest: latest.to_string(),
            }
            .into());
        }
        Ok(Self { earliest, latest })
    }

    pub fn earliest(&self) -> NaiveDateTime {
        self.earliest
    }

    pub fn latest(&self) -> NaiveDateTime {
        self.latest
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.earliest <= ts && ts < self.latest
    }

    pub fn span(&self) -> Duration {
        self.latest - self.earliest
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.earliest, self.latest)
    }
}
