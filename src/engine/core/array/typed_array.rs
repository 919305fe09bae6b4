use arrow_array::cast::AsArray;
use arrow_array::types::{Float64Type, Int64Type, TimestampNanosecondType};
use arrow_array::{Array as _, ArrayRef, new_empty_array};

use crate::engine::core::array::builder::ArrayBuilder;
use crate::engine::errors::TableError;
use crate::engine::types::{DType, Value};

/// Immutable, length-bearing run of typed values.
///
/// Cloning and slicing share the underlying buffers, which may live in a shared-memory
/// mapping when the array was read back from the store.
#[derive(Debug, Clone)]
pub struct Array {
    dtype: DType,
    data: ArrayRef,
}

impl Array {
    /// Wraps an Arrow array, rejecting data types outside [`DType`].
    pub fn from_arrow(data: ArrayRef) -> Result<Self, TableError> {
        let dtype = DType::from_arrow_data_type(data.data_type())?;
        Ok(Self { dtype, data })
    }

    pub fn empty(dtype: DType) -> Self {
        Self {
            dtype,
            data: new_empty_array(&dtype.to_arrow_data_type()),
        }
    }

    pub fn try_from_values<I, V>(dtype: DType, values: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut builder = ArrayBuilder::new(dtype);
        for value in values {
            builder.append(value.into())?;
        }
        builder.finish()
    }

    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.data.null_count()
    }

    pub fn is_null(&self, idx: usize) -> bool {
        self.data.is_null(idx)
    }

    pub fn as_arrow(&self) -> &ArrayRef {
        &self.data
    }

    /// Zero-copy view over `[offset, offset + length)`.
    pub fn slice(&self, offset: usize, length: usize) -> Result<Self, TableError> {
        let end = offset.checked_add(length);
        if end.is_none_or(|end| end > self.len()) {
            return Err(TableError::OutOfRange(format!(
                "array slice [{}:{}) exceeds length {}",
                offset,
                offset.saturating_add(length),
                self.len()
            )));
        }
        Ok(Self {
            dtype: self.dtype,
            data: self.data.slice(offset, length),
        })
    }

    // The accessors below take a local index that the caller has already bounds-checked.

    pub(crate) fn bool_at(&self, idx: usize) -> Result<Option<bool>, TableError> {
        let arr = self.data.as_boolean_opt().ok_or_else(|| self.layout_error())?;
        Ok(arr.is_valid(idx).then(|| arr.value(idx)))
    }

    pub(crate) fn f64_at(&self, idx: usize) -> Result<Option<f64>, TableError> {
        let arr = self
            .data
            .as_primitive_opt::<Float64Type>()
            .ok_or_else(|| self.layout_error())?;
        Ok(arr.is_valid(idx).then(|| arr.value(idx)))
    }

    pub(crate) fn i64_at(&self, idx: usize) -> Result<Option<i64>, TableError> {
        let arr = self
            .data
            .as_primitive_opt::<Int64Type>()
            .ok_or_else(|| self.layout_error())?;
        Ok(arr.is_valid(idx).then(|| arr.value(idx)))
    }

    pub(crate) fn str_at(&self, idx: usize) -> Result<Option<&str>, TableError> {
        let arr = self
            .data
            .as_string_opt::<i32>()
            .ok_or_else(|| self.layout_error())?;
        Ok(arr.is_valid(idx).then(|| arr.value(idx)))
    }

    pub(crate) fn timestamp_nanos_at(&self, idx: usize) -> Result<Option<i64>, TableError> {
        let arr = self
            .data
            .as_primitive_opt::<TimestampNanosecondType>()
            .ok_or_else(|| self.layout_error())?;
        Ok(arr.is_valid(idx).then(|| arr.value(idx)))
    }

    pub(crate) fn value_at(&self, idx: usize) -> Result<Value, TableError> {
        let value = match self.dtype {
            DType::Bool => self.bool_at(idx)?.map(Value::Bool),
            DType::Float64 => self.f64_at(idx)?.map(Value::Float64),
            DType::Int64 => self.i64_at(idx)?.map(Value::Int64),
            DType::Utf8 => self.str_at(idx)?.map(|s| Value::Utf8(s.to_string())),
            DType::Timestamp => self.timestamp_nanos_at(idx)?.map(Value::Timestamp),
        };
        Ok(value.unwrap_or(Value::Null))
    }

    pub fn values(&self) -> Result<Vec<Value>, TableError> {
        (0..self.len()).map(|idx| self.value_at(idx)).collect()
    }

    fn layout_error(&self) -> TableError {
        TableError::InvariantViolation(format!(
            "{} array backed by arrow type {}",
            self.dtype,
            self.data.data_type()
        ))
    }
}
