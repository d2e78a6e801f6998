use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use blobvault_types::{BlobId, BlobRecord};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::SnapshotError;

/// Whole-state metadata file.
///
/// On-disk format is a single JSON object keyed by blob id, pretty-printed
/// with sorted keys:
///
/// ```text
/// {
///   "0190c3e2-...": { "URL": "a.txt", "owner": "alice", "public": false, "users": [] }
/// }
/// ```
///
/// Every flush rewrites the complete snapshot through a temporary file in the
/// same directory followed by a rename, so readers never observe a torn file.
#[derive(Clone, Debug)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write an empty snapshot if no file exists yet. Returns `true` if one was created.
    pub fn ensure_initialized(&self) -> Result<bool, SnapshotError> {
        if self.path.exists() {
            return Ok(false);
        }
        warn!(path = %self.path.display(), "initializing new blob database");
        self.flush(&BTreeMap::new())?;
        Ok(true)
    }

    /// Read the full snapshot.
    pub fn load(&self) -> Result<BTreeMap<BlobId, BlobRecord>, SnapshotError> {
        let data = fs::read(&self.path).map_err(|e| self.io(e))?;
        let records: BTreeMap<BlobId, BlobRecord> =
            serde_json::from_slice(&data).map_err(|e| SnapshotError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        debug!(path = %self.path.display(), records = records.len(), "loaded snapshot");
        Ok(records)
    }

    /// Atomically replace the snapshot with `records`.
    pub fn flush(&self, records: &BTreeMap<BlobId, BlobRecord>) -> Result<(), SnapshotError> {
        let data = serde_json::to_vec_pretty(records).map_err(|e| SnapshotError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| self.io(e))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.io(e))?;
        tmp.write_all(&data).map_err(|e| self.io(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io(e))?;
        tmp.persist(&self.path).map_err(|e| self.io(e.error))?;
        Ok(())
    }

    fn io(&self, source: std::io::Error) -> SnapshotError {
        SnapshotError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobvault_types::{Location, UserId};

    #[test]
    fn fresh_file_is_exactly_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbfile.json");
        let snapshot = SnapshotFile::new(&path);

        assert!(!path.exists());
        assert!(snapshot.ensure_initialized().unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
        assert!(snapshot.load().unwrap().is_empty());
    }

    #[test]
    fn existing_file_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blobs.json");
        fs::write(&path, "{}").unwrap();
        assert!(!SnapshotFile::new(&path).ensure_initialized().unwrap());
    }

    #[test]
    fn flush_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = SnapshotFile::new(dir.path().join("blobs.json"));
        let mut records = BTreeMap::new();
        records.insert(
            BlobId::new(),
            BlobRecord::new(Location::new("storage/a"), UserId::parse("alice").unwrap()),
        );
        snapshot.flush(&records).unwrap();
        assert_eq!(snapshot.load().unwrap(), records);
    }

    #[test]
    fn output_is_sorted_and_stable() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = SnapshotFile::new(dir.path().join("blobs.json"));
        let mut records = BTreeMap::new();
        for name in ["c", "a", "b"] {
            records.insert(
                BlobId::new(),
                BlobRecord::new(Location::new(format!("storage/{name}")), UserId::parse(name).unwrap()),
            );
        }
        snapshot.flush(&records).unwrap();
        let first = fs::read(snapshot.path()).unwrap();
        snapshot.flush(&snapshot.load().unwrap()).unwrap();
        assert_eq!(fs::read(snapshot.path()).unwrap(), first);

        let text = String::from_utf8(first).unwrap();
        let positions: Vec<_> = records.keys().map(|id| text.find(&id.to_string()).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn garbage_is_reported_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blobs.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(SnapshotFile::new(&path).load(), Err(SnapshotError::Corrupt { .. })));
    }

    #[test]
    fn missing_file_is_io() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = SnapshotFile::new(dir.path().join("absent.json"));
        assert!(matches!(snapshot.load(), Err(SnapshotError::Io { .. })));
    }
}
