use std::io::Read;

use blobvault_types::Location;

use crate::error::StoreResult;

/// Byte storage keyed by [`Location`].
///
/// All implementations must satisfy these invariants:
/// - `locate` is pure: it sanitizes and roots a filename without touching storage.
/// - `write` either stores the full payload or leaves the previous content intact.
/// - `remove` fails if nothing is stored at the location.
/// - All I/O errors are propagated, never silently ignored.
pub trait ContentStore: Send + Sync {
    /// The location an upload named `filename` would occupy.
    fn locate(&self, filename: &str) -> StoreResult<Location>;

    /// Write `data` at `location`, replacing existing content.
    fn write(&self, location: &Location, data: &[u8]) -> StoreResult<()>;

    /// Delete the content at `location`.
    fn remove(&self, location: &Location) -> StoreResult<()>;

    /// Read the full content at `location`.
    fn read(&self, location: &Location) -> StoreResult<Vec<u8>>;

    /// Open the content at `location` for streaming.
    fn open(&self, location: &Location) -> StoreResult<Box<dyn Read + Send>>;

    /// Check whether anything is stored at `location`.
    fn exists(&self, location: &Location) -> StoreResult<bool>;

    /// Sanitize `filename`, write `data` there, and return the location.
    fn put(&self, filename: &str, data: &[u8]) -> StoreResult<Location> {
        let location = self.locate(filename)?;
        self.write(&location, data)?;
        Ok(location)
    }
}
