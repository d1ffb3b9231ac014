//! Blob store abstraction.
//!
//! [`BlobStore`] fetches and replaces one named object. It knows nothing
//! about the log format. The production implementation is
//! [`s3::S3BlobStore`]; [`memory::InMemoryBlobStore`] keeps objects in
//! process memory for local runs and tests.
//!
//! Absence is not an error: [`BlobStore::fetch`] returns `Ok(None)` when the
//! object does not exist yet.

pub mod memory;
pub mod s3;

pub use memory::InMemoryBlobStore;
pub use s3::{S3BlobStore, S3Config};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Object contents together with the store's version tag for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedBlob {
    pub bytes: Bytes,
    /// Opaque version (an ETag for S3). Only conditional writes consult it.
    pub version: Option<String>,
}

/// Condition a [`BlobStore::replace`] must satisfy to take effect.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Precondition {
    /// Overwrite unconditionally; the last writer wins.
    #[default]
    None,
    /// Only create the object; fail if it already exists.
    Absent,
    /// Only overwrite if the stored version still matches.
    Matches(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// Network, authorisation or service failure.
    #[error("{operation} of '{key}' failed: {message}")]
    Backend {
        operation: &'static str,
        key: String,
        message: String,
    },

    /// A conditional replace lost against a concurrent writer.
    #[error("'{key}' was modified concurrently")]
    PreconditionFailed { key: String },
}

impl StoreError {
    pub(crate) fn backend(operation: &'static str, key: &str, message: impl Into<String>) -> Self {
        StoreError::Backend {
            operation,
            key: key.to_owned(),
            message: message.into(),
        }
    }
}

/// A remote key/value object store holding whole blobs.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Read the object at `key`, or `None` if it does not exist.
    async fn fetch(&self, key: &str) -> Result<Option<VersionedBlob>, StoreError>;

    /// Replace the full contents of the object at `key`.
    async fn replace(&self, key: &str, bytes: Bytes, precondition: Precondition) -> Result<(), StoreError>;
}
