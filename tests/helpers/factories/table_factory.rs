use indexmap::IndexMap;

use crate::engine::core::{Array, Column, Table};
use crate::engine::schema::{Field, Schema};
use crate::engine::types::{DType, Value};

const BASE_TIMESTAMP_NANOS: i64 = 1_700_000_000_000_000_000;

/// Builds single-chunk tables column by column with predictable values.
pub struct TableFactory {
    columns: Vec<Column>,
    metadata: IndexMap<String, String>,
}

impl TableFactory {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            metadata: IndexMap::new(),
        }
    }

    fn with_values(mut self, name: &str, dtype: DType, values: Vec<Value>) -> Self {
        let array = Array::try_from_values(dtype, values).unwrap();
        self.columns
            .push(Column::new(Field::new(name, dtype), array).unwrap());
        self
    }

    /// `0, 1, 2, ...`
    pub fn with_int_column(self, name: &str, rows: usize) -> Self {
        let values = (0..rows as i64).map(Value::Int64).collect();
        self.with_values(name, DType::Int64, values)
    }

    /// `0.0, 0.5, 1.0, ...`
    pub fn with_float_column(self, name: &str, rows: usize) -> Self {
        let values = (0..rows).map(|i| Value::Float64(i as f64 * 0.5)).collect();
        self.with_values(name, DType::Float64, values)
    }

    /// `true, false, true, ...`
    pub fn with_bool_column(self, name: &str, rows: usize) -> Self {
        let values = (0..rows).map(|i| Value::Bool(i % 2 == 0)).collect();
        self.with_values(name, DType::Bool, values)
    }

    /// `"row-0", "row-1", ...`
    pub fn with_string_column(self, name: &str, rows: usize) -> Self {
        let values = (0..rows).map(|i| Value::Utf8(format!("row-{i}"))).collect();
        self.with_values(name, DType::Utf8, values)
    }

    /// One millisecond apart, starting at 2023-11-14T22:13:20Z.
    pub fn with_timestamp_column(self, name: &str, rows: usize) -> Self {
        let values = (0..rows as i64)
            .map(|i| Value::Timestamp(BASE_TIMESTAMP_NANOS + i * 1_000_000))
            .collect();
        self.with_values(name, DType::Timestamp, values)
    }

    /// Dtype follows the first non-null value; an all-null column is int64.
    pub fn with_column_values(self, name: &str, values: Vec<Value>) -> Self {
        let dtype = values
            .iter()
            .find_map(Value::dtype)
            .unwrap_or(DType::Int64);
        self.with_values(name, dtype, values)
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn create(self) -> Table {
        let schema: Schema = self.columns.iter().map(|c| c.field().clone()).collect();
        Table::new(schema.with_metadata(self.metadata), self.columns).unwrap()
    }
}
