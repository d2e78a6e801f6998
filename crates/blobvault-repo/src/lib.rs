//! Blob metadata repository for BlobVault.
//!
//! [`BlobRepository`] is the aggregate root: it owns every blob record, keeps
//! identifiers and locations unique, gates mutation on ownership and reads on
//! the access list, delegates bytes to a [`blobvault_store::ContentStore`],
//! and persists the complete record set after every mutation.
//!
//! # Design Rules
//!
//! 1. Ids are generated here, never accepted from callers.
//! 2. Existence is checked before authorization: unknown ids are `NotFound`
//!    for everyone.
//! 3. Content is written before a record points at it and removed before a
//!    record stops pointing at it.
//! 4. A failed operation leaves the snapshot file exactly as it was.
//! 5. The whole read-modify-flush cycle runs under one lock.

pub mod error;
pub mod index;
pub mod repository;
pub mod snapshot;

pub use error::{ErrorKind, RepoError, RepoResult, SnapshotError};
pub use index::BlobIndex;
pub use repository::BlobRepository;
pub use snapshot::SnapshotFile;

// Re-export key types
pub use blobvault_crypto::{BlobDigest, HashAlgorithm};
pub use blobvault_types::{BlobId, BlobRecord, BlobSummary, Location, Relationship, UserId};
