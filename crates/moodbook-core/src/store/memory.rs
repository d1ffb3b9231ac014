use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::{BlobStore, Precondition, StoreError, VersionedBlob};

/// Process-local blob store.
///
/// Versions are a per-store counter rendered as a string, bumped on every
/// successful replace, so conditional writes behave like they do on S3.
#[derive(Clone, Debug, Default)]
pub struct InMemoryBlobStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    objects: HashMap<String, (Bytes, u64)>,
    next_version: u64,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful replaces so far.
    pub async fn writes(&self) -> u64 {
        self.inner.read().await.next_version
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn fetch(&self, key: &str) -> Result<Option<VersionedBlob>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.objects.get(key).map(|(bytes, version)| VersionedBlob {
            bytes: bytes.clone(),
            version: Some(version.to_string()),
        }))
    }

    async fn replace(&self, key: &str, bytes: Bytes, precondition: Precondition) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let current = inner.objects.get(key).map(|(_, v)| v.to_string());

        let allowed = match (&precondition, current.as_deref()) {
            (Precondition::None, _) => true,
            (Precondition::Absent, existing) => existing.is_none(),
            (Precondition::Matches(expected), Some(existing)) => expected == existing,
            (Precondition::Matches(_), None) => false,
        };
        if !allowed {
            return Err(StoreError::PreconditionFailed { key: key.to_owned() });
        }

        inner.next_version += 1;
        let version = inner.next_version;
        inner.objects.insert(key.to_owned(), (bytes, version));
        Ok(())
    }
}
