use polars::prelude::{DataFrame, DataType, JsonFormat, JsonWriter, SerWriter};
use serde_json::Value;

use crate::error::{AggregationError, DataError, PanelwiseError, PanelwiseResult};

pub(crate) fn polars_err(context: &str, e: polars::error::PolarsError) -> PanelwiseError {
    PanelwiseError::Data(DataError::DataFrame(format!("{context}: {e}")))
}

/// Integer and floating point dtypes; booleans, strings and temporal types are not numeric.
pub(crate) fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

pub trait DataFrameExt {
    /// Values of a numeric column as `f64`, with nulls and NaNs reported as `None`.
    ///
    /// # Errors
    /// * [`DataError::ColumnNotFound`] if the column does not exist.
    /// * [`AggregationError::NonNumericColumn`] if its dtype is not numeric.
    fn f64_values(&self, name: &str) -> PanelwiseResult<Vec<Option<f64>>>;

    /// One flag per row telling whether the column holds an observed value.
    ///
    /// Nulls are unobserved for every dtype; NaN is unobserved for float columns.
    fn observed_mask(&self, name: &str) -> PanelwiseResult<Vec<bool>>;

    /// Rows as JSON objects keyed by column name; nulls become `null`.
    fn to_json_rows(&self) -> PanelwiseResult<Vec<serde_json::Map<String, Value>>>;
}

impl DataFrameExt for DataFrame {
    fn f64_values(&self, name: &str) -> PanelwiseResult<Vec<Option<f64>>> {
        let column = self
            .column(name)
            .map_err(|_| DataError::ColumnNotFound(name.to_string()))?;

        if !is_numeric(column.dtype()) {
            return Err(AggregationError::NonNumericColumn {
                column: name.to_string(),
                dtype: column.dtype().to_string(),
            }
            .into());
        }

        let cast = column
            .cast(&DataType::Float64)
            .map_err(|e| polars_err(&format!("Casting '{name}' to f64"), e))?;
        let values = cast
            .f64()
            .map_err(|e| polars_err(&format!("Reading '{name}' as f64"), e))?;

        Ok(values
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect())
    }

    fn observed_mask(&self, name: &str) -> PanelwiseResult<Vec<bool>> {
        let column = self
            .column(name)
            .map_err(|_| DataError::ColumnNotFound(name.to_string()))?;

        if is_numeric(column.dtype()) {
            return Ok(self
                .f64_values(name)?
                .into_iter()
                .map(|v| v.is_some())
                .collect());
        }

        Ok(column
            .as_materialized_series()
            .is_not_null()
            .into_iter()
            .map(|v| v.unwrap_or(false))
            .collect())
    }

    fn to_json_rows(&self) -> PanelwiseResult<Vec<serde_json::Map<String, Value>>> {
        if self.height() == 0 {
            return Ok(Vec::new());
        }

        let mut buf = Vec::new();
        JsonWriter::new(&mut buf)
            .with_json_format(JsonFormat::Json)
            .finish(&mut self.clone())
            .map_err(|e| polars_err("Writing rows as JSON", e))?;

        serde_json::from_slice(&buf)
            .map_err(|e| DataError::DataFrame(format!("Reading rows back from JSON: {e}")).into())
    }
}
