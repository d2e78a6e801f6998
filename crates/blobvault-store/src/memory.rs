use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use blobvault_types::Location;

use crate::error::{StoreError, StoreResult};
use crate::sanitize::sanitize_filename;
use crate::traits::ContentStore;

/// In-memory, HashMap-based content store.
///
/// Intended for tests and embedding. Content is held behind a `RwLock` and
/// cloned on read. The store can be flipped to read-only to simulate a
/// failing disk.
pub struct InMemoryContentStore {
    contents: RwLock<HashMap<Location, Vec<u8>>>,
    read_only: AtomicBool,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self {
            contents: RwLock::new(HashMap::new()),
            read_only: AtomicBool::new(false),
        }
    }

    /// Reject every subsequent `write` and `remove` with [`StoreError::ReadOnly`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Number of locations currently holding content.
    pub fn len(&self) -> usize {
        self.contents.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.contents.read().expect("lock poisoned").is_empty()
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::ReadOnly);
        }
        Ok(())
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentStore for InMemoryContentStore {
    fn locate(&self, filename: &str) -> StoreResult<Location> {
        let name = sanitize_filename(filename)?;
        Ok(Location::new(name))
    }

    fn write(&self, location: &Location, data: &[u8]) -> StoreResult<()> {
        self.check_writable()?;
        let mut map = self.contents.write().expect("lock poisoned");
        map.insert(location.clone(), data.to_vec());
        Ok(())
    }

    fn remove(&self, location: &Location) -> StoreResult<()> {
        self.check_writable()?;
        let mut map = self.contents.write().expect("lock poisoned");
        map.remove(location)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(location.clone()))
    }

    fn read(&self, location: &Location) -> StoreResult<Vec<u8>> {
        let map = self.contents.read().expect("lock poisoned");
        map.get(location)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(location.clone()))
    }

    fn open(&self, location: &Location) -> StoreResult<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(self.read(location)?)))
    }

    fn exists(&self, location: &Location) -> StoreResult<bool> {
        let map = self.contents.read().expect("lock poisoned");
        Ok(map.contains_key(location))
    }
}

impl std::fmt::Debug for InMemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContentStore")
            .field("entries", &self.len())
            .finish()
    }
}
