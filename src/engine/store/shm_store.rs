use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use arrow_buffer::Buffer;
use memmap2::{Mmap, MmapMut, MmapOptions};
use tracing::{debug, warn};

use crate::engine::errors::StoreError;
use crate::engine::store::backend::{GetTimeout, ObjectBuffer, ObjectStore};
use crate::engine::store::object_id::ObjectId;

const BUILDING_SUFFIX: &str = "building";

struct Held {
    data: Buffer,
    count: usize,
}

/// Object store backed by memory-mapped files in a shared directory.
///
/// An object under construction lives at `<root>/<hex>.building` and is hard-linked to
/// `<root>/<hex>` when sealed, so other processes never observe partial objects and a
/// sealed object is never replaced.
/// Readers map the sealed file read-only and hand the mapping out without copying.
pub struct ShmStore {
    root: PathBuf,
    poll_interval: Duration,
    building: HashMap<ObjectId, MmapMut>,
    held: HashMap<ObjectId, Held>,
    connected: bool,
}

impl ShmStore {
    pub fn connect(root: impl AsRef<Path>, poll_interval: Duration) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        debug!(target: "shm_tables::store", root = %root.display(), "Connected to shm store");
        Ok(Self {
            root,
            poll_interval,
            building: HashMap::new(),
            held: HashMap::new(),
            connected: true,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sealed_path(&self, id: &ObjectId) -> PathBuf {
        self.root.join(id.to_hex())
    }

    fn building_path(&self, id: &ObjectId) -> PathBuf {
        building_path(&self.root, id)
    }

    fn ensure_connected(&self) -> Result<(), StoreError> {
        if self.connected {
            Ok(())
        } else {
            Err(StoreError::Disconnected)
        }
    }

    /// Drops an unsealed object of this connection and its building file.
    fn abort(&mut self, id: &ObjectId) {
        if let Some(mmap) = self.building.remove(id) {
            drop(mmap);
            let _ = remove_building_file(&self.root, id);
        }
    }

    fn map_sealed(&self, id: &ObjectId) -> Result<Buffer, StoreError> {
        if let Some(held) = self.held.get(id) {
            return Ok(held.data.clone());
        }
        let file = File::open(self.sealed_path(id))?;
        let mmap = unsafe { MmapOptions::new().map(&file)? };
        Ok(mmap_buffer(mmap))
    }
}

fn building_path(root: &Path, id: &ObjectId) -> PathBuf {
    root.join(format!("{}.{}", id.to_hex(), BUILDING_SUFFIX))
}

/// A building file that is already gone counts as removed.
fn remove_building_file(root: &Path, id: &ObjectId) -> io::Result<()> {
    match fs::remove_file(building_path(root, id)) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => {
            warn!(target: "shm_tables::store", id = %id, error = %e, "Failed to abort unsealed object");
            Err(e)
        }
        _ => Ok(()),
    }
}

/// Wraps a read-only mapping in an Arrow buffer that keeps the mapping alive.
fn mmap_buffer(mmap: Mmap) -> Buffer {
    let len = mmap.len();
    let owner = Arc::new(mmap);
    let ptr = NonNull::new(owner.as_ptr() as *mut u8).unwrap_or(NonNull::dangling());
    // SAFETY: `ptr` points at `len` initialized bytes owned by `owner`, which the
    // buffer keeps alive. Sealed files are read-only and never written again.
    unsafe { Buffer::from_custom_allocation(ptr, len, owner) }
}

impl ObjectStore for ShmStore {
    fn create(&mut self, id: &ObjectId, size: usize) -> Result<&mut [u8], StoreError> {
        self.ensure_connected()?;
        if size == 0 {
            return Err(StoreError::Other(format!(
                "object {id} must have a positive size"
            )));
        }
        if self.building.contains_key(id) || self.sealed_path(id).exists() {
            return Err(StoreError::AlreadyExists(id.to_hex()));
        }

        let path = self.building_path(id);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => StoreError::AlreadyExists(id.to_hex()),
                _ => StoreError::Io(e),
            })?;
        let mapped = file
            .set_len(size as u64)
            .and_then(|()| unsafe { MmapMut::map_mut(&file) });
        let mmap = match mapped {
            Ok(mmap) => mmap,
            Err(e) => {
                let _ = fs::remove_file(&path);
                return Err(e.into());
            }
        };

        debug!(target: "shm_tables::store", id = %id, size, "Created shm object");
        match self.building.entry(*id) {
            Entry::Vacant(slot) => Ok(&mut slot.insert(mmap)[..]),
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(id.to_hex())),
        }
    }

    /// Publishes with a hard link so an object sealed concurrently under the same id is
    /// never replaced. The object stays owned by this connection until it is published.
    fn seal(&mut self, id: &ObjectId) -> Result<(), StoreError> {
        self.ensure_connected()?;
        let mmap = self
            .building
            .get(id)
            .ok_or_else(|| StoreError::NotCreated(id.to_hex()))?;
        mmap.flush()?;

        let building = self.building_path(id);
        let mut permissions = fs::metadata(&building)?.permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&building, permissions)?;

        match fs::hard_link(&building, self.sealed_path(id)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                self.abort(id);
                warn!(target: "shm_tables::store", id = %id, "Object was sealed elsewhere first");
                return Err(StoreError::AlreadyExists(id.to_hex()));
            }
            Err(e) => return Err(e.into()),
        }

        self.building.remove(id);
        if let Err(e) = fs::remove_file(&building) {
            warn!(target: "shm_tables::store", id = %id, error = %e, "Failed to unlink building file");
        }
        debug!(target: "shm_tables::store", id = %id, "Sealed shm object");
        Ok(())
    }

    fn get(
        &mut self,
        ids: &[ObjectId],
        timeout: GetTimeout,
    ) -> Result<Vec<ObjectBuffer>, StoreError> {
        self.ensure_connected()?;
        let deadline = timeout.deadline(Instant::now());

        while let Some(missing) = ids
            .iter()
            .find(|id| !self.held.contains_key(id) && !self.sealed_path(id).exists())
        {
            let now = Instant::now();
            let pause = match deadline {
                Some(deadline) if now >= deadline => {
                    return Err(StoreError::NotFound(missing.to_hex()));
                }
                Some(deadline) => self.poll_interval.min(deadline - now),
                None => self.poll_interval,
            };
            thread::sleep(pause);
        }

        let mut buffers = Vec::with_capacity(ids.len());
        for id in ids {
            let data = self.map_sealed(id).map_err(|e| match e {
                StoreError::Io(io) if io.kind() == io::ErrorKind::NotFound => {
                    StoreError::NotFound(id.to_hex())
                }
                other => other,
            })?;
            buffers.push(ObjectBuffer { id: *id, data });
        }

        for buffer in &buffers {
            self.held
                .entry(buffer.id)
                .and_modify(|held| held.count += 1)
                .or_insert_with(|| Held {
                    data: buffer.data.clone(),
                    count: 1,
                });
        }
        Ok(buffers)
    }

    fn release(&mut self, id: &ObjectId) -> Result<(), StoreError> {
        self.ensure_connected()?;
        match self.held.get_mut(id) {
            None => Err(StoreError::NotHeld(id.to_hex())),
            Some(held) => {
                held.count -= 1;
                if held.count == 0 {
                    self.held.remove(id);
                }
                Ok(())
            }
        }
    }

    fn contains(&self, id: &ObjectId) -> Result<bool, StoreError> {
        self.ensure_connected()?;
        Ok(self.sealed_path(id).exists())
    }

    fn delete(&mut self, id: &ObjectId) -> Result<(), StoreError> {
        self.ensure_connected()?;
        if self.held.contains_key(id) {
            return Err(StoreError::InUse(id.to_hex()));
        }
        let sealed = self.sealed_path(id);
        if !sealed.exists() {
            if self.building.contains_key(id) || self.building_path(id).exists() {
                return Err(StoreError::NotSealed(id.to_hex()));
            }
            return Err(StoreError::NotFound(id.to_hex()));
        }
        fs::remove_file(&sealed).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(id.to_hex()),
            _ => StoreError::Io(e),
        })?;
        debug!(target: "shm_tables::store", id = %id, "Deleted shm object");
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), StoreError> {
        if !self.connected {
            return Ok(());
        }
        self.connected = false;
        self.held.clear();

        let mut first_error = None;
        for (id, mmap) in self.building.drain() {
            drop(mmap);
            if let Err(e) = remove_building_file(&self.root, &id) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

impl Drop for ShmStore {
    fn drop(&mut self) {
        let _ = self.disconnect();
    }
}
