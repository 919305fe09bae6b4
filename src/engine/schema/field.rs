use std::fmt;

use arrow_schema::Field as ArrowField;

use crate::engine::errors::TableError;
use crate::engine::types::DType;

/// A named, typed slot in a schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    name: String,
    dtype: DType,
}

impl Field {
    pub fn new(name: impl Into<String>, dtype: DType) -> Self {
        Self {
            name: name.into(),
            dtype,
        }
    }

    /// Builds a field from a raw dtype code, rejecting codes outside the supported set.
    pub fn from_code(name: impl Into<String>, code: i32) -> Result<Self, TableError> {
        Ok(Self::new(name, DType::from_code(code)?))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self::new(name, self.dtype)
    }

    /// Every field is nullable on the wire; null markers live in the arrays.
    pub fn to_arrow(&self) -> ArrowField {
        ArrowField::new(&self.name, self.dtype.to_arrow_data_type(), true)
    }

    pub fn from_arrow(field: &ArrowField) -> Result<Self, TableError> {
        let dtype = DType::from_arrow_data_type(field.data_type())?;
        Ok(Self::new(field.name().clone(), dtype))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.dtype)
    }
}
