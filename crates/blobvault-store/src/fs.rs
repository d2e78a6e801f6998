use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};

use blobvault_types::Location;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::sanitize::sanitize_filename;
use crate::traits::ContentStore;

/// Content store backed by a directory on local disk.
///
/// Locations are the sanitized filename relative to the root. The root is
/// joined on at access time only, so moving or re-spelling the root never
/// changes a stored location.
#[derive(Clone, Debug)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join a location onto the root, refusing anything that escapes it.
    fn resolve(&self, location: &Location) -> StoreResult<PathBuf> {
        let relative = location.as_path();
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || relative.as_os_str().is_empty() {
            return Err(StoreError::OutsideRoot(location.clone()));
        }
        Ok(self.root.join(relative))
    }

    fn not_found(location: &Location, err: io::Error) -> StoreError {
        if err.kind() == io::ErrorKind::NotFound {
            StoreError::NotFound(location.clone())
        } else {
            StoreError::Io(err)
        }
    }
}

impl ContentStore for FsContentStore {
    fn locate(&self, filename: &str) -> StoreResult<Location> {
        let name = sanitize_filename(filename)?;
        Ok(Location::new(name))
    }

    fn write(&self, location: &Location, data: &[u8]) -> StoreResult<()> {
        let path = self.resolve(location)?;
        let parent = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent)?;

        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;

        debug!(location = %location, bytes = data.len(), "wrote blob content");
        Ok(())
    }

    fn remove(&self, location: &Location) -> StoreResult<()> {
        let path = self.resolve(location)?;
        fs::remove_file(&path).map_err(|e| Self::not_found(location, e))?;
        debug!(location = %location, "removed blob content");
        Ok(())
    }

    fn read(&self, location: &Location) -> StoreResult<Vec<u8>> {
        let path = self.resolve(location)?;
        fs::read(&path).map_err(|e| Self::not_found(location, e))
    }

    fn open(&self, location: &Location) -> StoreResult<Box<dyn Read + Send>> {
        let path = self.resolve(location)?;
        let file = File::open(&path).map_err(|e| Self::not_found(location, e))?;
        Ok(Box::new(file))
    }

    fn exists(&self, location: &Location) -> StoreResult<bool> {
        let path = self.resolve(location)?;
        Ok(path.is_file())
    }
}
