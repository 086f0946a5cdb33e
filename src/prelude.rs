// 1. Tables
pub use crate::panel::table::PanelTable;
pub use crate::table::{TimeTable, index::IndexKind, polars_ext::DataFrameExt};

// 2. Calendar
pub use crate::time::{
    bounds::Bounds, granularity::Granularity, offset::CalendarOffset, zone::Zone,
};

// 3. Series & Aggregations
pub use crate::agg::{
    AggValue, Aggregation, Bucket,
    builtins::{average_per_day, count, max, mean, min, percentile, ratio, sum},
};
pub use crate::series::{AnnotationStyle, LineStyle, SeriesSpec, SeriesStyle};

// 4. Panels & Charts
pub use crate::chart::{Chart, ChartBuilder, ChartConfig, auto::layout};
pub use crate::format::NumberFormat;
pub use crate::panel::Panel;
pub use crate::reshape::split_month_by_day;

// 5. Errors
pub use crate::error::{
    AggregationError, ConfigError, DataError, PanelwiseError, PanelwiseResult,
};
