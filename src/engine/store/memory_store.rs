use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::time::Instant;

use arrow_buffer::Buffer;
use parking_lot::{Condvar, Mutex};
use tracing::debug;

use crate::engine::errors::StoreError;
use crate::engine::store::backend::{GetTimeout, ObjectBuffer, ObjectStore};
use crate::engine::store::object_id::ObjectId;

enum Slot {
    Building,
    Sealed { data: Buffer, refs: usize },
}

#[derive(Default)]
struct Shared {
    objects: Mutex<HashMap<ObjectId, Slot>>,
    sealed: Condvar,
}

fn is_sealed(objects: &HashMap<ObjectId, Slot>, id: &ObjectId) -> bool {
    matches!(objects.get(id), Some(Slot::Sealed { .. }))
}

/// In-process object store.
///
/// Connections made with [`MemoryStore::new_connection`] share one object table, so
/// a reader on one thread can block in `get` until a writer on another thread seals.
pub struct MemoryStore {
    shared: Arc<Shared>,
    building: HashMap<ObjectId, Vec<u8>>,
    held: HashMap<ObjectId, usize>,
    connected: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_shared(Arc::new(Shared::default()))
    }

    pub fn new_connection(&self) -> Self {
        Self::with_shared(Arc::clone(&self.shared))
    }

    fn with_shared(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            building: HashMap::new(),
            held: HashMap::new(),
            connected: true,
        }
    }

    /// References held on `id` across all connections.
    pub fn ref_count(&self, id: &ObjectId) -> usize {
        match self.shared.objects.lock().get(id) {
            Some(Slot::Sealed { refs, .. }) => *refs,
            _ => 0,
        }
    }

    pub fn sealed_count(&self) -> usize {
        self.shared
            .objects
            .lock()
            .values()
            .filter(|slot| matches!(slot, Slot::Sealed { .. }))
            .count()
    }

    fn ensure_connected(&self) -> Result<(), StoreError> {
        if self.connected {
            Ok(())
        } else {
            Err(StoreError::Disconnected)
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for MemoryStore {
    fn create(&mut self, id: &ObjectId, size: usize) -> Result<&mut [u8], StoreError> {
        self.ensure_connected()?;
        {
            let mut objects = self.shared.objects.lock();
            if objects.contains_key(id) {
                return Err(StoreError::AlreadyExists(id.to_hex()));
            }
            objects.insert(*id, Slot::Building);
        }
        match self.building.entry(*id) {
            Entry::Vacant(slot) => Ok(slot.insert(vec![0u8; size]).as_mut_slice()),
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(id.to_hex())),
        }
    }

    fn seal(&mut self, id: &ObjectId) -> Result<(), StoreError> {
        self.ensure_connected()?;
        let data = self
            .building
            .remove(id)
            .ok_or_else(|| StoreError::NotCreated(id.to_hex()))?;
        let size = data.len();
        self.shared.objects.lock().insert(
            *id,
            Slot::Sealed {
                data: Buffer::from_vec(data),
                refs: 0,
            },
        );
        self.shared.sealed.notify_all();
        debug!(target: "shm_tables::store", id = %id, size, "Sealed in-memory object");
        Ok(())
    }

    fn get(
        &mut self,
        ids: &[ObjectId],
        timeout: GetTimeout,
    ) -> Result<Vec<ObjectBuffer>, StoreError> {
        self.ensure_connected()?;
        let shared = Arc::clone(&self.shared);
        let deadline = timeout.deadline(Instant::now());

        let mut objects = shared.objects.lock();
        while let Some(missing) = ids.iter().find(|id| !is_sealed(&objects, id)).copied() {
            match deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return Err(StoreError::NotFound(missing.to_hex()));
                    }
                    shared.sealed.wait_until(&mut objects, deadline);
                }
                None => shared.sealed.wait(&mut objects),
            }
        }

        let mut buffers = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(Slot::Sealed { data, refs }) = objects.get_mut(id) {
                *refs += 1;
                buffers.push(ObjectBuffer {
                    id: *id,
                    data: data.clone(),
                });
            }
        }
        drop(objects);

        for id in ids {
            *self.held.entry(*id).or_default() += 1;
        }
        Ok(buffers)
    }

    fn release(&mut self, id: &ObjectId) -> Result<(), StoreError> {
        self.ensure_connected()?;
        match self.held.get_mut(id) {
            None => return Err(StoreError::NotHeld(id.to_hex())),
            Some(count) => {
                *count -= 1;
                if *count == 0 {
                    self.held.remove(id);
                }
            }
        }
        if let Some(Slot::Sealed { refs, .. }) = self.shared.objects.lock().get_mut(id) {
            *refs = refs.saturating_sub(1);
        }
        Ok(())
    }

    fn contains(&self, id: &ObjectId) -> Result<bool, StoreError> {
        self.ensure_connected()?;
        Ok(is_sealed(&self.shared.objects.lock(), id))
    }

    fn delete(&mut self, id: &ObjectId) -> Result<(), StoreError> {
        self.ensure_connected()?;
        let mut objects = self.shared.objects.lock();
        match objects.get(id) {
            None => Err(StoreError::NotFound(id.to_hex())),
            Some(Slot::Building) => Err(StoreError::NotSealed(id.to_hex())),
            Some(Slot::Sealed { refs, .. }) if *refs > 0 => Err(StoreError::InUse(id.to_hex())),
            Some(Slot::Sealed { .. }) => {
                objects.remove(id);
                Ok(())
            }
        }
    }

    fn disconnect(&mut self) -> Result<(), StoreError> {
        if !self.connected {
            return Ok(());
        }
        let mut objects = self.shared.objects.lock();
        for (id, count) in self.held.drain() {
            if let Some(Slot::Sealed { refs, .. }) = objects.get_mut(&id) {
                *refs = refs.saturating_sub(count);
            }
        }
        for (id, _) in self.building.drain() {
            objects.remove(&id);
        }
        self.connected = false;
        Ok(())
    }
}

impl Drop for MemoryStore {
    fn drop(&mut self) {
        let _ = self.disconnect();
    }
}
