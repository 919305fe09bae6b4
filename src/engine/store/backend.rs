use std::time::{Duration, Instant};

use arrow_buffer::Buffer;

use crate::engine::errors::StoreError;
use crate::engine::store::object_id::ObjectId;

/// How long `get` waits for objects that are not sealed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetTimeout {
    /// Return at once if anything is missing.
    Immediate,
    For(Duration),
    Forever,
}

impl GetTimeout {
    /// `0` returns immediately, a positive value waits that many milliseconds and a
    /// negative value waits indefinitely.
    pub fn from_millis(millis: i64) -> Self {
        match millis {
            0 => GetTimeout::Immediate,
            ms if ms < 0 => GetTimeout::Forever,
            ms => GetTimeout::For(Duration::from_millis(ms as u64)),
        }
    }

    pub fn deadline(&self, now: Instant) -> Option<Instant> {
        match self {
            GetTimeout::Immediate => Some(now),
            GetTimeout::For(d) => Some(now + *d),
            GetTimeout::Forever => None,
        }
    }
}

/// A sealed object handed out by [`ObjectStore::get`].
#[derive(Debug, Clone)]
pub struct ObjectBuffer {
    pub id: ObjectId,
    pub data: Buffer,
}

/// Connection to a store of immutable, shared byte objects.
///
/// Objects go through `create` (writable, invisible to readers) and `seal` (immutable,
/// visible). Every buffer returned by `get` counts as one reference held by this
/// connection until `release`.
pub trait ObjectStore: Send {
    /// Allocates exactly `size` writable bytes under `id`.
    fn create(&mut self, id: &ObjectId, size: usize) -> Result<&mut [u8], StoreError>;

    fn seal(&mut self, id: &ObjectId) -> Result<(), StoreError>;

    /// Waits up to `timeout` for every id to be sealed. Either all buffers are returned
    /// or none are, with `NotFound` naming the first missing id.
    fn get(
        &mut self,
        ids: &[ObjectId],
        timeout: GetTimeout,
    ) -> Result<Vec<ObjectBuffer>, StoreError>;

    fn release(&mut self, id: &ObjectId) -> Result<(), StoreError>;

    fn contains(&self, id: &ObjectId) -> Result<bool, StoreError>;

    /// Removes a sealed object that this connection does not hold.
    fn delete(&mut self, id: &ObjectId) -> Result<(), StoreError>;

    /// Drops held references and aborts unsealed objects created by this connection.
    fn disconnect(&mut self) -> Result<(), StoreError>;
}
