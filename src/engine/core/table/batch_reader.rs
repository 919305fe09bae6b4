use std::sync::Arc;

use arrow_array::{Array as _, ArrayRef, RecordBatch};
use arrow_schema::SchemaRef as ArrowSchemaRef;

use crate::engine::core::table::columnar_table::Table;
use crate::engine::errors::TableError;

#[derive(Debug, Clone, Copy, Default)]
struct ChunkCursor {
    chunk: usize,
    offset: usize,
}

/// Yields a table as Arrow record batches without copying.
///
/// Columns may be chunked differently, so each batch ends at the nearest chunk boundary
/// of any column; every batch is a set of zero-copy views into the original chunks.
pub struct TableBatchReader<'a> {
    table: &'a Table,
    arrow_schema: ArrowSchemaRef,
    cursors: Vec<ChunkCursor>,
    row: usize,
}

impl<'a> TableBatchReader<'a> {
    pub fn new(table: &'a Table) -> Self {
        Self {
            table,
            arrow_schema: table.schema().to_arrow(),
            cursors: vec![ChunkCursor::default(); table.num_columns()],
            row: 0,
        }
    }

    pub fn arrow_schema(&self) -> &ArrowSchemaRef {
        &self.arrow_schema
    }

    fn next_batch(&mut self) -> Result<RecordBatch, TableError> {
        let table = self.table;
        let columns = table.columns();

        let mut batch_len = usize::MAX;
        for (column, cursor) in columns.iter().zip(self.cursors.iter_mut()) {
            loop {
                let chunk = column.chunk(cursor.chunk).ok_or_else(|| {
                    TableError::InvariantViolation(format!(
                        "column '{}' ran out of chunks at row {}",
                        column.name(),
                        self.row
                    ))
                })?;
                if cursor.offset < chunk.len() {
                    batch_len = batch_len.min(chunk.len() - cursor.offset);
                    break;
                }
                cursor.chunk += 1;
                cursor.offset = 0;
            }
        }

        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());
        for (column, cursor) in columns.iter().zip(self.cursors.iter_mut()) {
            let data = column
                .chunk(cursor.chunk)
                .map(|chunk| chunk.as_arrow())
                .ok_or_else(|| {
                    TableError::InvariantViolation("chunk cursor moved past the end".into())
                })?;
            if cursor.offset == 0 && batch_len == data.len() {
                arrays.push(Arc::clone(data));
            } else {
                arrays.push(data.slice(cursor.offset, batch_len));
            }
            cursor.offset += batch_len;
        }

        self.row += batch_len;
        Ok(RecordBatch::try_new(Arc::clone(&self.arrow_schema), arrays)?)
    }
}

impl Iterator for TableBatchReader<'_> {
    type Item = Result<RecordBatch, TableError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.table.num_columns() == 0 || self.row >= self.table.num_rows() {
            return None;
        }
        let batch = self.next_batch();
        if batch.is_err() {
            // Do not keep yielding after a failure.
            self.row = self.table.num_rows();
        }
        Some(batch)
    }
}
