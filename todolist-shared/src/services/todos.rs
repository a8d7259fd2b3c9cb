/// Todo aggregate operations
///
/// [`TodoService`] owns the mutation rules of a todo together with its theme
/// set and attached image. Every operation takes the pool and the caller's
/// user ID explicitly and only ever touches rows owned by that caller.
///
/// # Blob sequencing
///
/// Relational writes of one operation share a transaction. Blob calls are
/// ordered around it:
///
/// - create: store the upload, then insert; if the insert fails the upload
///   is removed again
/// - update: store the new upload, then update and replace themes; the old
///   blob is deleted before commit, and a failed delete rolls back; on any
///   failure the new upload is removed
/// - delete: delete the row, then the blob before commit; a failed blob
///   delete rolls back
///
/// A commit that fails after the old blob is gone leaves the row pointing
/// at a missing blob. That is logged at error level with the row and blob
/// name; reads of such a row report the image as not found.
///
/// Reads run in a `REPEATABLE READ READ ONLY` transaction so a todo and its
/// theme set always come from the same snapshot.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use todolist_shared::blob::FilesystemBlobStore;
/// use todolist_shared::services::{TodoInput, TodoService};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, caller: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let service = TodoService::new(Arc::new(FilesystemBlobStore::new("./uploads")));
///
/// let input = TodoInput {
///     title: "Buy milk".to_string(),
///     description: "2%".to_string(),
///     category_id: 1,
///     theme_ids: vec![1, 2],
///     expected_version: None,
/// };
/// let todo = service.create(&pool, caller, input, None).await?;
/// assert_eq!(todo.themes.len(), 2);
/// # Ok(())
/// # }
/// ```

use crate::blob::{BlobError, BlobStore};
use crate::models::category::TODOS_CATEGORY_FK;
use crate::models::todo::{CreateTodo, Todo, TodoDetail, UpdateTodo};
use crate::models::todo_theme::{distinct_theme_ids, group_by_todo, TodoTheme, TODO_THEMES_THEME_FK};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Longest accepted title, in characters
pub const MAX_TITLE_LEN: usize = 255;

/// A single rejected input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Todo service error types
#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    /// One or more input fields were rejected
    #[error("Validation failed: {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// No todo with this id is owned by the caller
    #[error("Todo not found")]
    NotFound,

    /// The todo changed since the caller read it
    #[error("Todo was modified concurrently")]
    Conflict,

    #[error("Storage error: {0}")]
    Storage(#[from] BlobError),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for TodoError {
    fn from(err: sqlx::Error) -> Self {
        let constraint = match &err {
            sqlx::Error::Database(db_err) => db_err.constraint().map(str::to_owned),
            _ => None,
        };

        match constraint.as_deref() {
            Some(TODOS_CATEGORY_FK) => TodoError::Validation(vec![FieldError::new(
                "category_id",
                "Category does not exist",
            )]),
            Some(TODO_THEMES_THEME_FK) => TodoError::Validation(vec![FieldError::new(
                "theme_ids",
                "One or more themes do not exist",
            )]),
            _ => TodoError::Database(err),
        }
    }
}

/// Submitted fields of a create or edit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoInput {
    pub title: String,
    pub description: String,
    pub category_id: i64,

    /// Full theme set; duplicates are collapsed
    #[serde(default)]
    pub theme_ids: Vec<i64>,

    /// Version the caller last read; ignored on create
    #[serde(default)]
    pub expected_version: Option<i32>,
}

impl TodoInput {
    /// Checks every field and returns the trimmed input
    ///
    /// All failing fields are reported together.
    pub fn validate(self) -> Result<Self, TodoError> {
        let mut errors = Vec::new();

        let title = self.title.trim().to_string();
        if title.is_empty() {
            errors.push(FieldError::new("title", "Title is required"));
        } else if title.chars().count() > MAX_TITLE_LEN {
            errors.push(FieldError::new(
                "title",
                format!("Title must be at most {} characters", MAX_TITLE_LEN),
            ));
        }

        let description = self.description.trim().to_string();
        if description.is_empty() {
            errors.push(FieldError::new("description", "Description is required"));
        }

        if self.category_id <= 0 {
            errors.push(FieldError::new("category_id", "Category is required"));
        }

        if self.theme_ids.iter().any(|id| *id <= 0) {
            errors.push(FieldError::new("theme_ids", "Theme ids must be positive"));
        }

        if !errors.is_empty() {
            return Err(TodoError::Validation(errors));
        }

        Ok(Self {
            title,
            description,
            category_id: self.category_id,
            theme_ids: distinct_theme_ids(&self.theme_ids),
            expected_version: self.expected_version,
        })
    }
}

/// An uploaded file as received from the client
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Content of a todo's attached image
#[derive(Debug, Clone)]
pub struct TodoImage {
    pub stored_file_name: String,
    pub bytes: Vec<u8>,
}

/// Todo aggregate operations, scoped to the calling user
#[derive(Clone)]
pub struct TodoService {
    blobs: Arc<dyn BlobStore>,
}

impl TodoService {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    /// Lists all todos owned by `caller`, ordered by id
    pub async fn list(&self, pool: &PgPool, caller: Uuid) -> Result<Vec<TodoDetail>, TodoError> {
        let mut tx = begin_snapshot(pool).await?;

        let rows = Todo::list_owned_with_category(&mut *tx, caller).await?;
        let ids: Vec<i64> = rows.iter().map(|row| row.todo.id).collect();
        let mut themes = group_by_todo(TodoTheme::themes_for_todos(&mut *tx, &ids).await?);

        tx.commit().await?;

        debug!(user_id = %caller, count = rows.len(), "Listed todos");

        Ok(rows
            .into_iter()
            .map(|row| {
                let todo_themes = themes.remove(&row.todo.id).unwrap_or_default();
                TodoDetail::assemble(row, todo_themes)
            })
            .collect())
    }

    /// Gets one todo owned by `caller`
    pub async fn get(&self, pool: &PgPool, caller: Uuid, todo_id: i64) -> Result<TodoDetail, TodoError> {
        let mut tx = begin_snapshot(pool).await?;
        let detail = load_detail(&mut *tx, caller, todo_id).await?;
        tx.commit().await?;

        detail.ok_or(TodoError::NotFound)
    }

    /// Creates a todo owned by `caller`, with its theme set and optional image
    pub async fn create(
        &self,
        pool: &PgPool,
        caller: Uuid,
        input: TodoInput,
        file: Option<UploadedFile>,
    ) -> Result<TodoDetail, TodoError> {
        let input = input.validate()?;
        let stored_file_name = self.store_upload(file).await?;

        let result = insert_todo(pool, caller, input, stored_file_name.clone()).await;
        match result {
            Ok(detail) => {
                info!(
                    user_id = %caller,
                    todo_id = detail.id,
                    themes = detail.themes.len(),
                    has_image = detail.stored_file_name.is_some(),
                    "Created todo"
                );
                Ok(detail)
            }
            Err(e) => {
                self.discard_upload(stored_file_name.as_deref()).await;
                Err(e)
            }
        }
    }

    /// Edits a todo owned by `caller`
    ///
    /// Replaces the full theme set with `input.theme_ids`. Without a new
    /// file the current image reference is kept; with one, the old blob is
    /// removed.
    pub async fn update(
        &self,
        pool: &PgPool,
        caller: Uuid,
        todo_id: i64,
        input: TodoInput,
        file: Option<UploadedFile>,
    ) -> Result<TodoDetail, TodoError> {
        let input = input.validate()?;

        let current = Todo::find_owned(pool, caller, todo_id)
            .await?
            .ok_or(TodoError::NotFound)?;

        let read_version = match input.expected_version {
            Some(expected) if expected != current.version => return Err(TodoError::Conflict),
            _ => current.version,
        };

        let new_file_name = self.store_upload(file).await?;

        let result = self
            .update_in_tx(
                pool,
                caller,
                todo_id,
                read_version,
                input,
                new_file_name.clone(),
                current.stored_file_name,
            )
            .await;

        match result {
            Ok(detail) => {
                info!(
                    user_id = %caller,
                    todo_id,
                    version = detail.version,
                    replaced_image = new_file_name.is_some(),
                    "Updated todo"
                );
                Ok(detail)
            }
            Err(e) => {
                self.discard_upload(new_file_name.as_deref()).await;
                Err(e)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn update_in_tx(
        &self,
        pool: &PgPool,
        caller: Uuid,
        todo_id: i64,
        read_version: i32,
        input: TodoInput,
        new_file_name: Option<String>,
        old_file_name: Option<String>,
    ) -> Result<TodoDetail, TodoError> {
        let mut tx = pool.begin().await?;

        let changes = UpdateTodo {
            title: input.title,
            description: input.description,
            category_id: input.category_id,
            stored_file_name: new_file_name.clone(),
        };

        let updated = Todo::update_versioned(&mut *tx, caller, todo_id, read_version, changes).await?;
        if updated.is_none() {
            let exists = Todo::exists_owned(&mut *tx, caller, todo_id).await?;
            return Err(stale_update_error(exists));
        }

        TodoTheme::replace_for_todo(&mut *tx, todo_id, &input.theme_ids).await?;

        let detail = load_detail(&mut *tx, caller, todo_id)
            .await?
            .ok_or(TodoError::NotFound)?;

        let replaced = match (&new_file_name, &old_file_name) {
            (Some(new), Some(old)) if new != old => Some(old.as_str()),
            _ => None,
        };
        if let Some(old) = replaced {
            self.blobs.delete(old).await?;
        }

        commit_after_blob_delete(tx, todo_id, replaced).await?;
        Ok(detail)
    }

    /// Deletes a todo owned by `caller`, with its image
    ///
    /// Returns `false` without changing anything when no such todo exists.
    pub async fn delete(&self, pool: &PgPool, caller: Uuid, todo_id: i64) -> Result<bool, TodoError> {
        let mut tx = pool.begin().await?;

        let Some(removed) = Todo::delete_owned(&mut *tx, caller, todo_id).await? else {
            debug!(user_id = %caller, todo_id, "Delete of missing todo");
            return Ok(false);
        };

        if let Some(name) = &removed.stored_file_name {
            self.blobs.delete(name).await?;
        }

        commit_after_blob_delete(tx, todo_id, removed.stored_file_name.as_deref()).await?;

        info!(user_id = %caller, todo_id, "Deleted todo");
        Ok(true)
    }

    /// Reads the image attached to a todo owned by `caller`
    pub async fn read_image(&self, pool: &PgPool, caller: Uuid, todo_id: i64) -> Result<TodoImage, TodoError> {
        let todo = Todo::find_owned(pool, caller, todo_id)
            .await?
            .ok_or(TodoError::NotFound)?;

        let stored_file_name = todo.stored_file_name.ok_or(TodoError::NotFound)?;

        let bytes = match self.blobs.read(&stored_file_name).await {
            Ok(bytes) => bytes,
            Err(BlobError::NotFound(_)) => {
                warn!(todo_id, blob = %stored_file_name, "Todo references a missing blob");
                return Err(TodoError::NotFound);
            }
            Err(e) => return Err(e.into()),
        };

        Ok(TodoImage {
            stored_file_name,
            bytes,
        })
    }

    async fn store_upload(&self, file: Option<UploadedFile>) -> Result<Option<String>, TodoError> {
        match file {
            Some(file) => Ok(Some(self.blobs.store(&file.file_name, &file.bytes).await?)),
            None => Ok(None),
        }
    }

    /// Best-effort removal of an upload whose relational write failed
    async fn discard_upload(&self, name: Option<&str>) {
        if let Some(name) = name {
            if let Err(e) = self.blobs.delete(name).await {
                warn!(blob = %name, error = %e, "Failed to remove orphaned upload");
            }
        }
    }
}

/// Outcome of a versioned update that matched no row
///
/// The row still being there means another writer bumped the version.
fn stale_update_error(still_exists: bool) -> TodoError {
    if still_exists {
        TodoError::Conflict
    } else {
        TodoError::NotFound
    }
}

/// Starts a read-only transaction with a single snapshot for all statements
async fn begin_snapshot(pool: &PgPool) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}

async fn commit_after_blob_delete(
    tx: Transaction<'_, Postgres>,
    todo_id: i64,
    deleted_blob: Option<&str>,
) -> Result<(), sqlx::Error> {
    tx.commit().await.map_err(|e| {
        if let Some(blob) = deleted_blob {
            error!(todo_id, blob = %blob, error = %e, "Commit failed after blob delete; row references a missing blob");
        }
        e
    })
}

async fn insert_todo(
    pool: &PgPool,
    caller: Uuid,
    input: TodoInput,
    stored_file_name: Option<String>,
) -> Result<TodoDetail, TodoError> {
    let mut tx = pool.begin().await?;

    let todo = Todo::insert(
        &mut *tx,
        CreateTodo {
            owner_user_id: caller,
            title: input.title,
            description: input.description,
            category_id: input.category_id,
            stored_file_name,
        },
    )
    .await?;

    TodoTheme::insert_many(&mut *tx, todo.id, &input.theme_ids).await?;

    let detail = load_detail(&mut *tx, caller, todo.id)
        .await?
        .ok_or(TodoError::NotFound)?;

    tx.commit().await?;
    Ok(detail)
}

async fn load_detail(
    conn: &mut PgConnection,
    caller: Uuid,
    todo_id: i64,
) -> Result<Option<TodoDetail>, sqlx::Error> {
    let Some(row) = Todo::find_owned_with_category(&mut *conn, caller, todo_id).await? else {
        return Ok(None);
    };

    let mut themes = group_by_todo(TodoTheme::themes_for_todos(&mut *conn, &[todo_id]).await?);
    Ok(Some(TodoDetail::assemble(
        row,
        themes.remove(&todo_id).unwrap_or_default(),
    )))
}
