use super::{generate_blob_name, validate_blob_name, BlobError, BlobResult, BlobStore};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Filesystem blob store
///
/// Stores each blob as `{root}/{generated name}`. Writes go to a temp file
/// that is renamed into place, so a reader never observes a partial blob.
#[derive(Debug, Clone)]
pub struct FilesystemBlobStore {
    root: PathBuf,
}

impl FilesystemBlobStore {
    /// Creates a store rooted at `root`; the directory is created on first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> BlobResult<PathBuf> {
        validate_blob_name(name)?;
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn store(&self, original_name: &str, data: &[u8]) -> BlobResult<String> {
        let name = generate_blob_name(original_name);
        let full_path = self.path_for(&name)?;

        fs::create_dir_all(&self.root).await.map_err(|e| {
            warn!(root = %self.root.display(), error = %e, "blob: create_dir_all failed");
            e
        })?;

        let temp_path = self.root.join(format!(".{}.tmp", name));
        let mut file = fs::File::create(&temp_path).await?;
        if let Err(e) = write_all_synced(&mut file, data).await {
            drop(file);
            let _ = fs::remove_file(&temp_path).await;
            warn!(blob = %name, error = %e, "blob: write failed");
            return Err(e.into());
        }
        drop(file);

        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "blob: rename failed");
            e
        })?;

        debug!(blob = %name, size = data.len(), "blob: stored");
        Ok(name)
    }

    async fn read(&self, name: &str) -> BlobResult<Vec<u8>> {
        let full_path = self.path_for(name)?;
        match fs::read(&full_path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(BlobError::NotFound(name.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, name: &str) -> BlobResult<()> {
        let full_path = self.path_for(name)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => {
                debug!(blob = %name, "blob: deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(blob = %name, "blob: delete of missing blob");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, name: &str) -> BlobResult<bool> {
        let full_path = self.path_for(name)?;
        Ok(fs::try_exists(&full_path).await?)
    }
}

async fn write_all_synced(file: &mut fs::File, data: &[u8]) -> std::io::Result<()> {
    file.write_all(data).await?;
    file.sync_all().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_read_delete_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path().join("uploads"));

        let name = store.store("photo.png", b"png-bytes").await.unwrap();

        assert!(name.ends_with("_photo.png"));
        assert!(store.exists(&name).await.unwrap());
        assert_eq!(store.read(&name).await.unwrap(), b"png-bytes");
        assert!(store.root().join(&name).is_file());

        store.delete(&name).await.unwrap();
        assert!(!store.exists(&name).await.unwrap());
        assert!(matches!(store.read(&name).await, Err(BlobError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path());

        store.store("a.txt", b"a").await.unwrap();
        store.store("a.txt", b"b").await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|n| !n.ends_with(".tmp")));
    }

    #[tokio::test]
    async fn test_delete_missing_blob_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path());

        store.delete("0123_missing.png").await.unwrap();
        assert!(!store.exists("0123_missing.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path());

        assert!(matches!(
            store.read("../secret").await,
            Err(BlobError::InvalidName(_))
        ));
        assert!(matches!(
            store.delete("..").await,
            Err(BlobError::InvalidName(_))
        ));
    }
}
