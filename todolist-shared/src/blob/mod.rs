/// Storage for uploaded files
///
/// Uploaded images are written under a generated, collision-resistant name
/// and referenced from `todos.stored_file_name`. The todo service sequences
/// store/delete calls around its database transactions; the store itself
/// knows nothing about todos.
///
/// # Backends
///
/// - [`FilesystemBlobStore`]: one file per blob under a root directory
/// - [`MemoryBlobStore`]: in-process map, for tests
///
/// # Example
///
/// ```no_run
/// use todolist_shared::blob::{BlobStore, FilesystemBlobStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = FilesystemBlobStore::new("./uploads");
/// let name = store.store("photo.png", b"...").await?;
/// assert!(store.exists(&name).await?);
/// store.delete(&name).await?;
/// # Ok(())
/// # }
/// ```

mod filesystem;
mod memory;

pub use filesystem::FilesystemBlobStore;
pub use memory::MemoryBlobStore;

use async_trait::async_trait;
use uuid::Uuid;

/// Longest sanitized original name kept in a generated blob name
const MAX_ORIGINAL_NAME_LEN: usize = 100;

/// Blob store error types
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// No blob with this name
    #[error("Blob not found: {0}")]
    NotFound(String),

    /// Name is not a plain file name
    #[error("Invalid blob name: {0}")]
    InvalidName(String),

    /// Underlying I/O failure
    #[error("Blob I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Blob store result type alias
pub type BlobResult<T> = Result<T, BlobError>;

/// Persists uploaded file content by generated name
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `data` and returns the generated name
    async fn store(&self, original_name: &str, data: &[u8]) -> BlobResult<String>;

    /// Reads a stored blob
    async fn read(&self, name: &str) -> BlobResult<Vec<u8>>;

    /// Deletes a stored blob; deleting a missing blob succeeds
    async fn delete(&self, name: &str) -> BlobResult<()>;

    /// Checks whether a blob exists
    async fn exists(&self, name: &str) -> BlobResult<bool>;
}

/// Generates a unique blob name from an uploaded file's original name
///
/// Format: `{uuid-v4 simple}_{sanitized original}`.
pub fn generate_blob_name(original_name: &str) -> String {
    format!(
        "{}_{}",
        Uuid::new_v4().simple(),
        sanitize_file_name(original_name)
    )
}

/// Reduces a client-supplied file name to a safe single path component
///
/// Only the last path segment is kept; characters outside
/// `[A-Za-z0-9._-]` become `_`, leading dots are stripped, and the result is
/// capped at 100 characters. Falls back to `upload` when nothing is left.
pub fn sanitize_file_name(original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed: String = cleaned
        .trim_start_matches('.')
        .chars()
        .take(MAX_ORIGINAL_NAME_LEN)
        .collect();

    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed
    }
}

/// Rejects names that are not a single plain path component
pub(crate) fn validate_blob_name(name: &str) -> BlobResult<()> {
    let invalid = name.is_empty()
        || name.contains(['/', '\\', '\0'])
        || name == "."
        || name == "..";

    if invalid {
        return Err(BlobError::InvalidName(name.to_string()));
    }
    Ok(())
}
