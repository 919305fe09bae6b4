pub mod backend;
pub mod client;
pub mod memory_store;
pub mod object_id;
pub mod shm_store;

pub use backend::{GetTimeout, ObjectBuffer, ObjectStore};
pub use client::Client;
pub use memory_store::MemoryStore;
pub use object_id::{ID_LENGTH, ObjectId};
pub use shm_store::ShmStore;

#[cfg(test)]
mod memory_store_test;
