use std::path::PathBuf;

use blobvault_crypto::HasherError;
use blobvault_store::StoreError;
use blobvault_types::{BlobId, Location, Relationship, UserId};
use thiserror::Error;

/// The closed set of failure classes a repository operation can raise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    Unauthorized,
    InvalidState,
    Io,
}

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("blob not found: {0}")]
    BlobNotFound(BlobId),

    #[error("user {user} is not in the access list of blob {blob}")]
    UserNotFound { blob: BlobId, user: UserId },

    #[error("a blob already exists at {0}")]
    LocationTaken(Location),

    #[error("blob id already in use: {0}")]
    IdTaken(BlobId),

    #[error(
        "{} is not {required} of blob {blob}",
        .user.as_ref().map_or("anonymous", UserId::as_str)
    )]
    Unauthorized {
        blob: BlobId,
        user: Option<UserId>,
        required: Relationship,
    },

    #[error("filename {0:?} has no usable characters")]
    InvalidFilename(String),

    #[error("blob {blob} already has public = {public}")]
    VisibilityUnchanged { blob: BlobId, public: bool },

    #[error("content store error: {0}")]
    Store(#[from] StoreError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("hash error: {0}")]
    Hash(#[from] HasherError),
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BlobNotFound(_) | Self::UserNotFound { .. } => ErrorKind::NotFound,
            Self::LocationTaken(_) | Self::IdTaken(_) => ErrorKind::AlreadyExists,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::VisibilityUnchanged { .. } | Self::InvalidFilename(_) => ErrorKind::InvalidState,
            Self::Store(_) | Self::Snapshot(_) | Self::Hash(_) => ErrorKind::Io,
        }
    }
}

/// Errors reading or writing the metadata snapshot file.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt snapshot {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },
}

pub type RepoResult<T> = Result<T, RepoError>;
