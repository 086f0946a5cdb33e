//! Calendar primitives: bucket bounds, granularities, calendar offsets and time zones.

pub mod bounds;
pub mod granularity;
pub mod offset;
pub mod zone;
