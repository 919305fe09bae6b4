//! Arrow IPC stream encoding of tables.
//!
//! Writing always happens in two passes over the same encoder: once into a
//! [`CountingSink`] to learn the exact size, then into a [`FixedSizeWriter`] over a buffer
//! allocated at that size. Reading decodes directly over a shared buffer.

pub mod sink;
pub mod stream;

pub use sink::{CountingSink, FixedSizeWriter};
pub use stream::{deserialize, serialize, serialized_size, write_into};

#[cfg(test)]
mod sink_test;
