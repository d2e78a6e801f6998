use blobvault_types::Location;

/// Errors from content store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Nothing is stored at the requested location.
    #[error("no content at {0}")]
    NotFound(Location),

    /// The filename has nothing left after sanitization.
    #[error("invalid filename: {0:?}")]
    InvalidFilename(String),

    /// The location does not resolve inside the storage root.
    #[error("location {0} is outside the storage root")]
    OutsideRoot(Location),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage backend is read-only or otherwise unavailable.
    #[error("store is read-only")]
    ReadOnly,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
