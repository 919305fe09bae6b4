use std::sync::Arc;

use arrow_array::ArrayRef;
use arrow_array::builder::{
    BooleanBuilder, Float64Builder, Int64Builder, StringBuilder, TimestampNanosecondBuilder,
};
use chrono::{DateTime, Utc};

use crate::engine::core::array::typed_array::Array;
use crate::engine::errors::TableError;
use crate::engine::types::{DType, Value};

enum TypedBuilder {
    Bool(BooleanBuilder),
    Float64(Float64Builder),
    Int64(Int64Builder),
    Utf8(StringBuilder),
    Timestamp(TimestampNanosecondBuilder),
}

impl TypedBuilder {
    fn new(dtype: DType, capacity: usize) -> Self {
        match dtype {
            DType::Bool => TypedBuilder::Bool(BooleanBuilder::with_capacity(capacity)),
            DType::Float64 => TypedBuilder::Float64(Float64Builder::with_capacity(capacity)),
            DType::Int64 => TypedBuilder::Int64(Int64Builder::with_capacity(capacity)),
            DType::Utf8 => TypedBuilder::Utf8(StringBuilder::with_capacity(capacity, capacity * 8)),
            DType::Timestamp => {
                TypedBuilder::Timestamp(TimestampNanosecondBuilder::with_capacity(capacity))
            }
        }
    }

    fn append_null(&mut self) {
        match self {
            TypedBuilder::Bool(b) => b.append_null(),
            TypedBuilder::Float64(b) => b.append_null(),
            TypedBuilder::Int64(b) => b.append_null(),
            TypedBuilder::Utf8(b) => b.append_null(),
            TypedBuilder::Timestamp(b) => b.append_null(),
        }
    }

    fn finish(self) -> ArrayRef {
        match self {
            TypedBuilder::Bool(mut b) => Arc::new(b.finish()),
            TypedBuilder::Float64(mut b) => Arc::new(b.finish()),
            TypedBuilder::Int64(mut b) => Arc::new(b.finish()),
            TypedBuilder::Utf8(mut b) => Arc::new(b.finish()),
            TypedBuilder::Timestamp(mut b) => Arc::new(b.finish()),
        }
    }
}

/// Append-only accumulator for one dtype.
///
/// `finish` hands out the immutable [`Array`] exactly once; every call afterwards fails
/// with [`TableError::BuilderFinished`].
pub struct ArrayBuilder {
    dtype: DType,
    inner: Option<TypedBuilder>,
    len: usize,
}

impl ArrayBuilder {
    pub fn new(dtype: DType) -> Self {
        Self::with_capacity(dtype, 0)
    }

    pub fn with_capacity(dtype: DType, capacity: usize) -> Self {
        Self {
            dtype,
            inner: Some(TypedBuilder::new(dtype, capacity)),
            len: 0,
        }
    }

    pub fn from_code(code: i32) -> Result<Self, TableError> {
        Ok(Self::new(DType::from_code(code)?))
    }

    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Number of values appended so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_none()
    }

    pub fn append_bool(&mut self, value: bool) -> Result<(), TableError> {
        let dtype = self.dtype;
        match self.open()? {
            TypedBuilder::Bool(b) => b.append_value(value),
            _ => return Err(TableError::type_mismatch(dtype, DType::Bool)),
        }
        self.len += 1;
        Ok(())
    }

    pub fn append_f64(&mut self, value: f64) -> Result<(), TableError> {
        let dtype = self.dtype;
        match self.open()? {
            TypedBuilder::Float64(b) => b.append_value(value),
            _ => return Err(TableError::type_mismatch(dtype, DType::Float64)),
        }
        self.len += 1;
        Ok(())
    }

    pub fn append_i64(&mut self, value: i64) -> Result<(), TableError> {
        let dtype = self.dtype;
        match self.open()? {
            TypedBuilder::Int64(b) => b.append_value(value),
            _ => return Err(TableError::type_mismatch(dtype, DType::Int64)),
        }
        self.len += 1;
        Ok(())
    }

    pub fn append_str(&mut self, value: &str) -> Result<(), TableError> {
        let dtype = self.dtype;
        match self.open()? {
            TypedBuilder::Utf8(b) => b.append_value(value),
            _ => return Err(TableError::type_mismatch(dtype, DType::Utf8)),
        }
        self.len += 1;
        Ok(())
    }

    pub fn append_timestamp_nanos(&mut self, nanos: i64) -> Result<(), TableError> {
        let dtype = self.dtype;
        match self.open()? {
            TypedBuilder::Timestamp(b) => b.append_value(nanos),
            _ => return Err(TableError::type_mismatch(dtype, DType::Timestamp)),
        }
        self.len += 1;
        Ok(())
    }

    /// Nanosecond timestamps cover roughly the years 1677 to 2262.
    pub fn append_timestamp(&mut self, value: DateTime<Utc>) -> Result<(), TableError> {
        self.append(Value::try_from(value)?)
    }

    pub fn append_null(&mut self) -> Result<(), TableError> {
        self.open()?.append_null();
        self.len += 1;
        Ok(())
    }

    pub fn append(&mut self, value: Value) -> Result<(), TableError> {
        match value {
            Value::Null => self.append_null(),
            Value::Bool(v) => self.append_bool(v),
            Value::Float64(v) => self.append_f64(v),
            Value::Int64(v) => self.append_i64(v),
            Value::Utf8(v) => self.append_str(&v),
            Value::Timestamp(v) => self.append_timestamp_nanos(v),
        }
    }

    pub fn finish(&mut self) -> Result<Array, TableError> {
        let inner = self.inner.take().ok_or(TableError::BuilderFinished)?;
        Array::from_arrow(inner.finish())
    }

    fn open(&mut self) -> Result<&mut TypedBuilder, TableError> {
        self.inner.as_mut().ok_or(TableError::BuilderFinished)
    }
}
