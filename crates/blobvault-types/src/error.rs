use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid blob id: {0}")]
    InvalidBlobId(String),

    #[error("invalid user id: {0:?}")]
    InvalidUserId(String),
}
