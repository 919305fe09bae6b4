use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::engine::codec;
use crate::engine::core::Table;
use crate::engine::errors::TableError;
use crate::engine::store::backend::{GetTimeout, ObjectStore};
use crate::engine::store::object_id::ObjectId;
use crate::engine::store::shm_store::ShmStore;
use crate::shared::config::{CONFIG, StoreConfig};

/// A session with an object store that moves whole tables in and out of it.
///
/// Tables are written as a single IPC stream object and read back as views over the
/// store's buffer. Every successful `read_table` holds one reference on the object until
/// `release` or `disconnect`.
pub struct Client {
    store: Option<Box<dyn ObjectStore>>,
    sealed: HashSet<ObjectId>,
}

impl Client {
    /// Opens a [`ShmStore`] rooted at `path`, polling at `store.poll_interval_ms` from
    /// the global config.
    pub fn connect(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let store = ShmStore::connect(path, poll_interval(&CONFIG.store))?;
        info!(target: "shm_tables::store", root = %store.root().display(), "Client connected");
        Ok(Self::with_store(store))
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self, TableError> {
        let store = ShmStore::connect(&config.path, poll_interval(config))?;
        info!(target: "shm_tables::store", root = %config.path, "Client connected");
        Ok(Self::with_store(store))
    }

    pub fn with_store(store: impl ObjectStore + 'static) -> Self {
        Self {
            store: Some(Box::new(store)),
            sealed: HashSet::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.store.is_some()
    }

    fn store(&mut self) -> Result<&mut Box<dyn ObjectStore>, TableError> {
        self.store
            .as_mut()
            .ok_or(TableError::NullArgument("client"))
    }

    /// Writes `table` under `id` and seals it, returning the object size in bytes.
    ///
    /// The stream is sized with a counting pass first, so the store allocation is exact.
    /// A failure after `create` leaves the object unsealed.
    pub fn write_table(&mut self, table: &Table, id: &ObjectId) -> Result<usize, TableError> {
        if self.store.is_none() {
            return Err(TableError::NullArgument("client"));
        }
        if self.sealed.contains(id) {
            return Err(TableError::Store(format!(
                "object {id} was already sealed by this client"
            )));
        }

        let size = codec::serialized_size(table)?;
        debug!(target: "shm_tables::store", id = %id, size, rows = table.num_rows(), "Probed stream size");

        let store = self.store()?;
        let buf = store.create(id, size).map_err(|e| TableError::Store(e.to_string()))?;
        let written = codec::write_into(table, buf)?;
        if written != size {
            return Err(TableError::InvariantViolation(format!(
                "wrote {written} bytes for object {id}, expected {size}"
            )));
        }

        store.seal(id).map_err(|e| TableError::Store(e.to_string()))?;
        self.sealed.insert(*id);
        info!(target: "shm_tables::store", id = %id, size, "Sealed table");
        Ok(size)
    }

    /// Reads the table stored under `id`.
    ///
    /// `timeout_ms == 0` fails at once when the object is absent, a positive value waits
    /// up to that many milliseconds and a negative value waits indefinitely.
    pub fn read_table(&mut self, id: &ObjectId, timeout_ms: i64) -> Result<Table, TableError> {
        let store = self.store()?;
        let mut buffers = store.get(&[*id], GetTimeout::from_millis(timeout_ms))?;

        if buffers.is_empty() {
            return Err(TableError::InvariantViolation(format!(
                "store returned no buffer for object {id} without reporting it missing"
            )));
        }
        if buffers.len() > 1 {
            let count = buffers.len();
            for buffer in &buffers {
                if let Err(e) = store.release(&buffer.id) {
                    warn!(target: "shm_tables::store", id = %buffer.id, error = %e, "Failed to release buffer");
                }
            }
            return Err(TableError::Unsupported(format!(
                "object {id} resolved to {count} buffers, expected exactly one"
            )));
        }

        let buffer = buffers.remove(0);
        let size = buffer.data.len();
        match codec::deserialize(buffer.data) {
            Ok(table) => {
                debug!(target: "shm_tables::store", id = %id, size, rows = table.num_rows(), "Read table");
                Ok(table)
            }
            Err(e) => {
                if let Err(release_err) = store.release(id) {
                    warn!(target: "shm_tables::store", id = %id, error = %release_err, "Failed to release buffer");
                }
                Err(e)
            }
        }
    }

    /// Drops one reference taken by [`Client::read_table`].
    pub fn release(&mut self, id: &ObjectId) -> Result<(), TableError> {
        self.store()?
            .release(id)
            .map_err(|e| TableError::Store(e.to_string()))?;
        debug!(target: "shm_tables::store", id = %id, "Released object");
        Ok(())
    }

    pub fn contains(&mut self, id: &ObjectId) -> Result<bool, TableError> {
        Ok(self.store()?.contains(id)?)
    }

    pub fn delete(&mut self, id: &ObjectId) -> Result<(), TableError> {
        self.store()?.delete(id)?;
        self.sealed.remove(id);
        info!(target: "shm_tables::store", id = %id, "Deleted object");
        Ok(())
    }

    /// Releases every outstanding reference and closes the session. Calling it on a
    /// disconnected client does nothing.
    pub fn disconnect(&mut self) -> Result<(), TableError> {
        let Some(mut store) = self.store.take() else {
            return Ok(());
        };
        self.sealed.clear();
        store.disconnect()?;
        info!(target: "shm_tables::store", "Client disconnected");
        Ok(())
    }
}

/// A zero interval would spin, so it is raised to one millisecond.
pub(crate) fn poll_interval(config: &StoreConfig) -> Duration {
    Duration::from_millis(config.poll_interval_ms.max(1))
}

impl Drop for Client {
    fn drop(&mut self) {
        if let Err(e) = self.disconnect() {
            warn!(target: "shm_tables::store", error = %e, "Disconnect on drop failed");
        }
    }
}
