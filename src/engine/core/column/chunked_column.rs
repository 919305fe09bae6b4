use chrono::{DateTime, Utc};
use tracing::debug;

use crate::engine::core::array::Array;
use crate::engine::errors::TableError;
use crate::engine::schema::Field;
use crate::engine::types::{DType, Value};

/// One logical sequence of values stored as physically separate chunks.
///
/// Row coordinates are `i64` so that callers passing negative indices get an
/// `OutOfRange` error instead of a wrapped-around lookup.
#[derive(Debug, Clone)]
pub struct Column {
    field: Field,
    chunks: Vec<Array>,
    len: usize,
}

impl Column {
    pub fn new(field: Field, array: Array) -> Result<Self, TableError> {
        Self::from_chunks(field, vec![array])
    }

    /// Every chunk must carry the field's dtype. An empty chunk list becomes a single
    /// empty chunk.
    pub fn from_chunks(field: Field, mut chunks: Vec<Array>) -> Result<Self, TableError> {
        if let Some(bad) = chunks.iter().find(|c| c.dtype() != field.dtype()) {
            return Err(TableError::type_mismatch(field.dtype(), bad.dtype()));
        }
        if chunks.is_empty() {
            chunks.push(Array::empty(field.dtype()));
        }
        let len = chunks.iter().map(Array::len).sum();
        Ok(Self { field, chunks, len })
    }

    #[inline]
    pub fn field(&self) -> &Field {
        &self.field
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.field.name()
    }

    #[inline]
    pub fn dtype(&self) -> DType {
        self.field.dtype()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn num_chunks(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunks(&self) -> &[Array] {
        &self.chunks
    }

    pub fn chunk(&self, idx: usize) -> Option<&Array> {
        self.chunks.get(idx)
    }

    pub fn null_count(&self) -> usize {
        self.chunks.iter().map(Array::null_count).sum()
    }

    /// Same chunks, published under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            field: self.field.with_name(name),
            chunks: self.chunks.clone(),
            len: self.len,
        }
    }

    pub fn bool_at(&self, index: i64) -> Result<Option<bool>, TableError> {
        let (chunk, local) = self.locate(index, DType::Bool)?;
        chunk.bool_at(local)
    }

    pub fn f64_at(&self, index: i64) -> Result<Option<f64>, TableError> {
        let (chunk, local) = self.locate(index, DType::Float64)?;
        chunk.f64_at(local)
    }

    pub fn i64_at(&self, index: i64) -> Result<Option<i64>, TableError> {
        let (chunk, local) = self.locate(index, DType::Int64)?;
        chunk.i64_at(local)
    }

    pub fn str_at(&self, index: i64) -> Result<Option<&str>, TableError> {
        let (chunk, local) = self.locate(index, DType::Utf8)?;
        chunk.str_at(local)
    }

    pub fn timestamp_nanos_at(&self, index: i64) -> Result<Option<i64>, TableError> {
        let (chunk, local) = self.locate(index, DType::Timestamp)?;
        chunk.timestamp_nanos_at(local)
    }

    pub fn timestamp_at(&self, index: i64) -> Result<Option<DateTime<Utc>>, TableError> {
        Ok(self
            .timestamp_nanos_at(index)?
            .map(DateTime::from_timestamp_nanos))
    }

    /// Untyped access; never fails on dtype.
    pub fn value_at(&self, index: i64) -> Result<Value, TableError> {
        let (chunk, local) = self.locate(index, self.dtype())?;
        chunk.value_at(local)
    }

    pub fn values(&self) -> Result<Vec<Value>, TableError> {
        let mut out = Vec::with_capacity(self.len);
        for chunk in &self.chunks {
            out.extend(chunk.values()?);
        }
        Ok(out)
    }

    /// Zero-copy view over rows `[offset, offset + length)`.
    pub fn slice(&self, offset: i64, length: i64) -> Result<Self, TableError> {
        let (mut skip, mut remaining) = checked_range(offset, length, self.len)?;

        let mut chunks = Vec::new();
        for chunk in &self.chunks {
            if remaining == 0 {
                break;
            }
            let chunk_len = chunk.len();
            if skip >= chunk_len {
                skip -= chunk_len;
                continue;
            }
            let take = (chunk_len - skip).min(remaining);
            if skip == 0 && take == chunk_len {
                chunks.push(chunk.clone());
            } else {
                chunks.push(chunk.slice(skip, take)?);
            }
            remaining -= take;
            skip = 0;
        }

        debug!(
            target: "shm_tables::column",
            column = %self.field.name(),
            offset,
            length,
            chunks = chunks.len(),
            "Sliced column"
        );
        Self::from_chunks(self.field.clone(), chunks)
    }

    fn locate(&self, index: i64, requested: DType) -> Result<(&Array, usize), TableError> {
        if index < 0 || index as u64 >= self.len as u64 {
            return Err(TableError::OutOfRange(format!(
                "row {} not in [0:{})",
                index, self.len
            )));
        }
        if requested != self.dtype() {
            return Err(TableError::type_mismatch(self.dtype(), requested));
        }

        let mut remainder = index as usize;
        for chunk in &self.chunks {
            if remainder < chunk.len() {
                return Ok((chunk, remainder));
            }
            remainder -= chunk.len();
        }

        Err(TableError::InvariantViolation(format!(
            "row {} passed the bounds check but no chunk of column '{}' covers it",
            index,
            self.field.name()
        )))
    }
}

/// Validates a signed `(offset, length)` pair against `len` and returns it unsigned.
pub(crate) fn checked_range(
    offset: i64,
    length: i64,
    len: usize,
) -> Result<(usize, usize), TableError> {
    let fits = offset >= 0
        && length >= 0
        && offset
            .checked_add(length)
            .is_some_and(|end| end as u64 <= len as u64);
    if !fits {
        return Err(TableError::OutOfRange(format!(
            "bad slice [{}:{}) of length {}",
            offset,
            offset.saturating_add(length),
            len
        )));
    }
    Ok((offset as usize, length as usize))
}
