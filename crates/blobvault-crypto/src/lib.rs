//! Content digests for BlobVault.
//!
//! Computes a fixed, ordered set of digests (MD5, SHA-1, SHA-256, SHA-512)
//! over a blob's bytes, either from a whole buffer or by streaming a reader.
//!
//! All digest operations wrap established libraries — no custom cryptography.

pub mod hasher;

pub use hasher::{BlobDigest, DigestEngine, HashAlgorithm, HasherError};
