//! Foundation types for BlobVault.
//!
//! This crate provides the identifiers and the persisted metadata record used
//! throughout BlobVault. Every other BlobVault crate depends on
//! `blobvault-types`.
//!
//! # Key Types
//!
//! - [`BlobId`] — Repository-generated blob identifier (UUID v7)
//! - [`UserId`] — Resolved caller identity
//! - [`Location`] — Path at which a blob's bytes are stored
//! - [`Access`] — Owner, explicit readers, and public flag; evaluates read/owner rights
//! - [`BlobRecord`] — The persisted metadata record for one blob

pub mod access;
pub mod error;
pub mod id;
pub mod record;

pub use access::{Access, Relationship};
pub use error::TypeError;
pub use id::{BlobId, Location, UserId};
pub use record::{BlobRecord, BlobSummary};
