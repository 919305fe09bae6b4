use std::fmt;
use std::str::FromStr;

use arrow_schema::{DataType, TimeUnit};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value as JsonValue};

use crate::engine::errors::TableError;

/// Element type of a field, array or column.
///
/// The numeric codes are stable and shared with external callers; they follow the
/// Arrow C++ type ids for the same logical types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    Bool,
    Float64,
    Int64,
    Utf8,
    /// Nanoseconds since the Unix epoch, no time zone.
    Timestamp,
}

impl DType {
    pub const BOOL_CODE: i32 = 1;
    pub const INT64_CODE: i32 = 9;
    pub const FLOAT64_CODE: i32 = 12;
    pub const UTF8_CODE: i32 = 13;
    pub const TIMESTAMP_CODE: i32 = 18;

    pub const ALL: [DType; 5] = [
        DType::Bool,
        DType::Float64,
        DType::Int64,
        DType::Utf8,
        DType::Timestamp,
    ];

    pub fn code(&self) -> i32 {
        match self {
            DType::Bool => Self::BOOL_CODE,
            DType::Float64 => Self::FLOAT64_CODE,
            DType::Int64 => Self::INT64_CODE,
            DType::Utf8 => Self::UTF8_CODE,
            DType::Timestamp => Self::TIMESTAMP_CODE,
        }
    }

    pub fn from_code(code: i32) -> Result<Self, TableError> {
        match code {
            Self::BOOL_CODE => Ok(DType::Bool),
            Self::FLOAT64_CODE => Ok(DType::Float64),
            Self::INT64_CODE => Ok(DType::Int64),
            Self::UTF8_CODE => Ok(DType::Utf8),
            Self::TIMESTAMP_CODE => Ok(DType::Timestamp),
            other => Err(TableError::UnknownDType(other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DType::Bool => "bool",
            DType::Float64 => "float64",
            DType::Int64 => "int64",
            DType::Utf8 => "string",
            DType::Timestamp => "timestamp",
        }
    }

    pub fn to_arrow_data_type(&self) -> DataType {
        match self {
            DType::Bool => DataType::Boolean,
            DType::Float64 => DataType::Float64,
            DType::Int64 => DataType::Int64,
            DType::Utf8 => DataType::Utf8,
            DType::Timestamp => DataType::Timestamp(TimeUnit::Nanosecond, None),
        }
    }

    pub fn from_arrow_data_type(data_type: &DataType) -> Result<Self, TableError> {
        match data_type {
            DataType::Boolean => Ok(DType::Bool),
            DataType::Float64 => Ok(DType::Float64),
            DataType::Int64 => Ok(DType::Int64),
            DataType::Utf8 => Ok(DType::Utf8),
            DataType::Timestamp(TimeUnit::Nanosecond, None) => Ok(DType::Timestamp),
            other => Err(TableError::Codec(format!(
                "unsupported arrow type: {other}"
            ))),
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DType {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bool" | "boolean" => Ok(DType::Bool),
            "float64" | "double" => Ok(DType::Float64),
            "int64" | "integer" => Ok(DType::Int64),
            "string" | "utf8" => Ok(DType::Utf8),
            "timestamp" => Ok(DType::Timestamp),
            other => Err(TableError::UnknownDTypeName(other.to_string())),
        }
    }
}

impl From<DType> for DataType {
    fn from(value: DType) -> Self {
        value.to_arrow_data_type()
    }
}

/// A single dynamically typed cell.
///
/// Floats compare bitwise so that a NaN written to the store compares equal to the NaN
/// read back.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Float64(f64),
    Int64(i64),
    Utf8(String),
    Timestamp(i64),
}

impl Value {
    /// The dtype this value can be appended to; `None` for nulls, which fit any dtype.
    pub fn dtype(&self) -> Option<DType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(DType::Bool),
            Value::Float64(_) => Some(DType::Float64),
            Value::Int64(_) => Some(DType::Int64),
            Value::Utf8(_) => Some(DType::Utf8),
            Value::Timestamp(_) => Some(DType::Timestamp),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self.dtype() {
            Some(dtype) => dtype.as_str(),
            None => "null",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Utf8(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(ns) => Some(DateTime::from_timestamp_nanos(*ns)),
            _ => None,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Int64(i) => JsonValue::Number(Number::from(*i)),
            Value::Float64(f) => Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Utf8(s) => JsonValue::String(s.clone()),
            Value::Timestamp(ns) => {
                JsonValue::String(DateTime::from_timestamp_nanos(*ns).to_rfc3339())
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => a.to_bits() == b.to_bits(),
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Utf8(a), Value::Utf8(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float64(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Utf8(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Utf8(value)
    }
}

/// Nanosecond timestamps cover roughly the years 1677 to 2262; anything else is rejected.
impl TryFrom<DateTime<Utc>> for Value {
    type Error = TableError;

    fn try_from(value: DateTime<Utc>) -> Result<Self, Self::Error> {
        value
            .timestamp_nanos_opt()
            .map(Value::Timestamp)
            .ok_or_else(|| {
                TableError::OutOfRange(format!("{value} not representable in nanoseconds"))
            })
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dtype_codes_round_trip() {
        for dtype in DType::ALL {
            assert_eq!(DType::from_code(dtype.code()).unwrap(), dtype);
        }
    }

    #[test]
    fn unknown_dtype_code_is_an_error() {
        let err = DType::from_code(42).expect_err("42 is not a dtype code");
        assert!(matches!(err, TableError::UnknownDType(42)));
    }

    #[test]
    fn arrow_types_map_one_to_one() {
        for dtype in DType::ALL {
            let arrow = dtype.to_arrow_data_type();
            assert_eq!(DType::from_arrow_data_type(&arrow).unwrap(), dtype);
        }
        let err = DType::from_arrow_data_type(&DataType::Int32).expect_err("int32 unsupported");
        assert!(matches!(err, TableError::Codec(_)));
    }

    #[test]
    fn nan_values_compare_bitwise() {
        assert_eq!(Value::Float64(f64::NAN), Value::Float64(f64::NAN));
        assert_ne!(Value::Float64(0.0), Value::Float64(-0.0));
        assert_ne!(Value::Int64(1), Value::Float64(1.0));
    }

    #[test]
    fn dtype_parses_from_names() {
        assert_eq!("int64".parse::<DType>().unwrap(), DType::Int64);
        assert_eq!("utf8".parse::<DType>().unwrap(), DType::Utf8);
        let err = "decimal".parse::<DType>().expect_err("decimal is not supported");
        assert!(matches!(err, TableError::UnknownDTypeName(ref name) if name == "decimal"));
    }

    #[test]
    fn datetimes_beyond_nanosecond_range_are_rejected() {
        use chrono::TimeZone;

        let far = Utc.with_ymd_and_hms(2500, 1, 1, 0, 0, 0).unwrap();
        let err = Value::try_from(far).expect_err("year 2500 overflows i64 nanoseconds");
        assert!(matches!(err, TableError::OutOfRange(_)));

        let near = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            Value::try_from(near).unwrap(),
            Value::Timestamp(near.timestamp_nanos_opt().unwrap())
        );
    }
}
