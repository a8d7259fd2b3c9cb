use super::{generate_blob_name, validate_blob_name, BlobError, BlobResult, BlobStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// In-memory blob store
///
/// Used by tests. Stores and deletes can be made to fail with an I/O error
/// to exercise rollback paths.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    fail_stores: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles simulated `store` failures
    pub fn fail_stores(&self, fail: bool) {
        self.fail_stores.store(fail, Ordering::SeqCst);
    }

    /// Toggles simulated `delete` failures
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Names of all stored blobs
    pub async fn names(&self) -> Vec<String> {
        self.blobs.read().await.keys().cloned().collect()
    }

    /// Number of stored blobs
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

fn simulated_failure(flag: &AtomicBool) -> BlobResult<()> {
    if flag.load(Ordering::SeqCst) {
        return Err(BlobError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "simulated failure",
        )));
    }
    Ok(())
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn store(&self, original_name: &str, data: &[u8]) -> BlobResult<String> {
        simulated_failure(&self.fail_stores)?;
        let name = generate_blob_name(original_name);
        self.blobs.write().await.insert(name.clone(), data.to_vec());
        Ok(name)
    }

    async fn read(&self, name: &str) -> BlobResult<Vec<u8>> {
        validate_blob_name(name)?;
        self.blobs
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(name.to_string()))
    }

    async fn delete(&self, name: &str) -> BlobResult<()> {
        validate_blob_name(name)?;
        simulated_failure(&self.fail_deletes)?;
        self.blobs.write().await.remove(name);
        Ok(())
    }

    async fn exists(&self, name: &str) -> BlobResult<bool> {
        validate_blob_name(name)?;
        Ok(self.blobs.read().await.contains_key(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryBlobStore::new();
        let name = store.store("note.txt", b"hello").await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.read(&name).await.unwrap(), b"hello");

        store.delete(&name).await.unwrap();
        store.delete(&name).await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_simulated_failures() {
        let store = MemoryBlobStore::new();
        let name = store.store("a.png", b"a").await.unwrap();

        store.fail_stores(true);
        assert!(matches!(store.store("b.png", b"b").await, Err(BlobError::Io(_))));
        store.delete(&name).await.unwrap();
        assert!(store.is_empty().await);

        store.fail_stores(false);
        let name = store.store("c.png", b"c").await.unwrap();
        store.fail_deletes(true);
        assert!(matches!(store.delete(&name).await, Err(BlobError::Io(_))));
        assert_eq!(store.names().await, vec![name.clone()]);

        store.fail_deletes(false);
        store.delete(&name).await.unwrap();
        assert!(store.is_empty().await);
    }
}
