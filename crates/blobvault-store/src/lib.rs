//! Content storage for BlobVault.
//!
//! The content store owns the physical lifecycle of blob bytes: it turns an
//! uploaded filename into a safe location under a storage root, writes,
//! reads and removes bytes there. It has no notion of blob ids, owners or
//! permissions; the repository is its only client.
//!
//! # Storage Backends
//!
//! All backends implement the [`ContentStore`] trait:
//!
//! - [`FsContentStore`] -- files under a directory on local disk
//! - [`InMemoryContentStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Every filename passes through [`sanitize_filename`] before it is joined
//!    to the storage root. This is a security boundary.
//! 2. Writes replace content atomically (temp file, then rename).
//! 3. Removing a location that holds nothing is an error, never a no-op.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod memory;
pub mod sanitize;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsContentStore;
pub use memory::InMemoryContentStore;
pub use sanitize::sanitize_filename;
pub use traits::ContentStore;
