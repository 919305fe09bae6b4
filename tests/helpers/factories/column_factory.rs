use crate::engine::core::{Array, Column};
use crate::engine::schema::Field;
use crate::engine::types::DType;

/// Builds an int64 column holding `0, 1, 2, ...` split into chunks of the given lengths.
pub struct ColumnFactory {
    name: String,
    chunk_lengths: Vec<usize>,
}

impl ColumnFactory {
    pub fn new() -> Self {
        Self {
            name: "col".to_string(),
            chunk_lengths: vec![10],
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_chunk_lengths(mut self, lengths: &[usize]) -> Self {
        self.chunk_lengths = lengths.to_vec();
        self
    }

    pub fn create(self) -> Column {
        let mut next = 0i64;
        let chunks = self
            .chunk_lengths
            .iter()
            .map(|&len| {
                let start = next;
                next += len as i64;
                Array::try_from_values(DType::Int64, start..next).unwrap()
            })
            .collect();
        Column::from_chunks(Field::new(self.name, DType::Int64), chunks).unwrap()
    }
}
