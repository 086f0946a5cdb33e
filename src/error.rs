use thiserror::Error;

pub type PanelwiseResult<T> = Result<T, PanelwiseError>;

#[derive(Debug, Error)]
pub enum PanelwiseError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    #[error(transparent)]
    Data(#[from] DataError),
}

impl PanelwiseError {
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    pub fn is_aggregation(&self) -> bool {
        matches!(self, Self::Aggregation(_))
    }

    pub fn is_data(&self) -> bool {
        matches!(self, Self::Data(_))
    }
}

/// Caller mistakes detected while building charts, panels, series or tables.
///
/// These are never transient; retrying with the same input fails the same way.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Panel needs at least one series without an offset (labels: {labels:?})")]
    NoAnchorSeries { labels: Vec<String> },

    #[error("Panel has no series")]
    NoSeries,

    #[error("Series '{0}' does not reference any column")]
    EmptySeriesColumns(String),

    #[error("Series label '{0}' is used more than once in the same panel")]
    DuplicateLabel(String),

    #[error("Invalid window size {0}: must be at least one bucket")]
    InvalidWindowSize(u32),

    #[error("Chart was given an explicit, empty panel list")]
    NoPanels,

    #[error("Data frame has no numeric columns to chart")]
    NoNumericColumns,

    #[error("Too many numeric columns ({found}) for line styles ({available})")]
    TooManyNumericColumns { found: usize, available: usize },

    #[error("Column '{column}' cannot be used as a time index (dtype: {dtype})")]
    InvalidIndex { column: String, dtype: String },

    #[error("Time index '{column}' has a missing timestamp at row {row}")]
    NullTimestamp { column: String, row: usize },

    #[error("Unsupported time zone on the time index: '{0}'")]
    UnsupportedTimeZone(String),

    #[error("Invalid percentile {0}: must be within 0..=100")]
    InvalidPercentile(f64),

    #[error("Invalid number format '{0}'")]
    InvalidFormat(String),

    #[error("Invalid y-axis limits ({low}, {high}): both must be finite and low < high")]
    InvalidYLimits { low: f64, high: f64 },
}

/// Errors raised while an aggregation function runs over a bucket.
#[derive(Debug, Error)]
pub enum AggregationError {
    #[error(
        "Aggregation '{aggregation}' for series '{label}' returned {width} values per bucket, expected a single value"
    )]
    UnsupportedShape {
        aggregation: String,
        label: String,
        width: usize,
    },

    #[error("Column '{column}' has non-numeric dtype {dtype} and cannot be aggregated")]
    NonNumericColumn { column: String, dtype: String },

    #[error("Column '{0}' is not part of the bucket")]
    MissingColumn(String),
}

/// Errors related to the raw data frame and calendar arithmetic on its index.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Data frame error: {0}")]
    DataFrame(String),

    #[error("Column not found: '{0}'")]
    ColumnNotFound(String),

    #[error("No rows with observed values in columns {0:?}")]
    NoObservations(Vec<String>),

    #[error("Timestamp out of range: {0}")]
    TimestampOverflow(String),

    #[error("Invalid bounds: earliest {earliest} is not before latest {latest}")]
    InvalidBounds { earliest: String, latest: String },
}
