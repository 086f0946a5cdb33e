//! Calendar-aligned windowing and aggregation for multi-panel time-series charts.
//!
//! A [`TimeTable`](table::TimeTable) wraps a polars `DataFrame` and its timestamp column. A
//! [`Panel`](panel::Panel) picks a [`Granularity`](time::granularity::Granularity), places a
//! window relative to the latest observation, buckets rows by calendar day, week or month and
//! reduces each bucket per [`SeriesSpec`](series::SeriesSpec). A [`Chart`](chart::Chart) runs
//! several panels over the same table and returns one aligned table per panel.
//!
//! ```no_run
//! use panelwise::prelude::*;
//!
//! # fn run(df: polars::frame::DataFrame) -> PanelwiseResult<()> {
//! let table = TimeTable::new(df, "day")?;
//! let columns = ["num_valid", "total_num"];
//! let success = SeriesSpec::new(columns, "success", ratio("num_valid", "total_num"));
//! let last_year = SeriesSpec::new(columns, "last year", ratio("num_valid", "total_num"))
//!     .with_offset(CalendarOffset::years(1));
//!
//! let chart = Chart::builder()
//!     .with_title("Reliability")
//!     .with_formatter(NumberFormat::pattern("{x:.1%}")?)
//!     .with_panel(Panel::daily(vec![success.clone()], 7)?)
//!     .with_panel(Panel::monthly(vec![success, last_year], 12)?)
//!     .build()?;
//!
//! for panel in chart.data(&table)? {
//!     println!("{}", panel.as_df());
//! }
//! # Ok(())
//! # }
//! ```

pub mod agg;
pub mod chart;
pub mod error;
pub mod format;
pub mod panel;
pub mod prelude;
pub mod reshape;
pub mod series;
pub mod table;
pub mod time;

pub use agg::{AggValue, Aggregation, Bucket};
pub use chart::{Chart, ChartBuilder, ChartConfig};
pub use error::{PanelwiseError, PanelwiseResult};
pub use panel::{Panel, table::PanelTable};
pub use series::SeriesSpec;
pub use table::TimeTable;
pub use time::granularity::Granularity;
