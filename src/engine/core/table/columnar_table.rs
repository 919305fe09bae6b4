use std::sync::Arc;

use arrow_array::RecordBatch;
use tracing::debug;

use crate::engine::core::array::Array;
use crate::engine::core::column::Column;
use crate::engine::core::column::chunked_column::checked_range;
use crate::engine::core::table::batch_reader::TableBatchReader;
use crate::engine::errors::TableError;
use crate::engine::schema::{Schema, SchemaRef};
use crate::engine::types::Value;

/// Schema plus equally long columns. Immutable once built.
#[derive(Debug, Clone)]
pub struct Table {
    schema: SchemaRef,
    columns: Vec<Column>,
    num_rows: usize,
}

impl Table {
    pub fn new(schema: impl Into<SchemaRef>, columns: Vec<Column>) -> Result<Self, TableError> {
        let schema = schema.into();
        if columns.len() != schema.len() {
            return Err(TableError::SchemaMismatch(format!(
                "schema has {} fields but {} columns were given",
                schema.len(),
                columns.len()
            )));
        }

        for (idx, (column, field)) in columns.iter().zip(schema.fields()).enumerate() {
            if column.field() != field {
                return Err(TableError::SchemaMismatch(format!(
                    "column {} is '{}' but schema expects '{}'",
                    idx,
                    column.field(),
                    field
                )));
            }
        }

        let num_rows = columns.first().map(Column::len).unwrap_or(0);
        if let Some((idx, column)) = columns
            .iter()
            .enumerate()
            .find(|(_, c)| c.len() != num_rows)
        {
            return Err(TableError::SchemaMismatch(format!(
                "column {} ('{}') has {} rows, expected {}",
                idx,
                column.name(),
                column.len(),
                num_rows
            )));
        }

        Ok(Self {
            schema,
            columns,
            num_rows,
        })
    }

    /// Builds a table whose schema is taken from the columns' own fields.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, TableError> {
        let schema = columns.iter().map(|c| c.field().clone()).collect::<Schema>();
        Self::new(schema, columns)
    }

    /// Reassembles a table from decoded record batches, one chunk per batch.
    pub fn from_record_batches(
        schema: impl Into<SchemaRef>,
        batches: &[RecordBatch],
    ) -> Result<Self, TableError> {
        let schema = schema.into();
        for (idx, batch) in batches.iter().enumerate() {
            let batch_schema = Schema::from_arrow(&batch.schema())?;
            if batch_schema.fields() != schema.fields() {
                return Err(TableError::Codec(format!(
                    "record batch {} schema does not match the stream schema",
                    idx
                )));
            }
        }

        let columns = schema
            .fields()
            .iter()
            .enumerate()
            .map(|(col_idx, field)| {
                let chunks = batches
                    .iter()
                    .map(|batch| Array::from_arrow(Arc::clone(batch.column(col_idx))))
                    .collect::<Result<Vec<_>, _>>()?;
                Column::from_chunks(field.clone(), chunks)
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            target: "shm_tables::table",
            batches = batches.len(),
            columns = columns.len(),
            "Assembled table from record batches"
        );
        Self::new(schema, columns)
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    #[inline]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_by_name(&self, name: &str) -> Result<&Column, TableError> {
        self.schema
            .index_of(name)
            .map(|idx| &self.columns[idx])
            .ok_or_else(|| TableError::NotFound(format!("column '{}'", name)))
    }

    pub fn column_by_index(&self, index: i64) -> Result<&Column, TableError> {
        usize::try_from(index)
            .ok()
            .and_then(|idx| self.columns.get(idx))
            .ok_or_else(|| {
                TableError::OutOfRange(format!(
                    "column {} not in [0:{})",
                    index,
                    self.columns.len()
                ))
            })
    }

    /// Zero-copy view over rows `[offset, offset + length)` of every column.
    pub fn slice(&self, offset: i64, length: i64) -> Result<Self, TableError> {
        checked_range(offset, length, self.num_rows)?;
        let columns = self
            .columns
            .iter()
            .map(|c| c.slice(offset, length))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(Arc::clone(&self.schema), columns)
    }

    pub fn row(&self, index: i64) -> Result<Vec<Value>, TableError> {
        if index < 0 || index as u64 >= self.num_rows as u64 {
            return Err(TableError::OutOfRange(format!(
                "row {} not in [0:{})",
                index, self.num_rows
            )));
        }
        self.columns.iter().map(|c| c.value_at(index)).collect()
    }

    pub fn record_batches(&self) -> TableBatchReader<'_> {
        TableBatchReader::new(self)
    }
}
