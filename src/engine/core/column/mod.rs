pub mod chunked_column;

pub use chunked_column::Column;

#[cfg(test)]
mod chunked_column_test;
