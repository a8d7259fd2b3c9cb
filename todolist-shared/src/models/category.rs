/// Category model
///
/// Every todo carries exactly one category. Categories are shared reference
/// data, not owned by a user.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE categories (
///     id BIGSERIAL PRIMARY KEY,
///     label VARCHAR(255) NOT NULL CHECK (length(trim(label)) > 0)
/// );
/// ```
///
/// Todos reference categories with `ON DELETE RESTRICT`: a category in use
/// cannot be deleted and [`Category::delete`] fails with a foreign key
/// violation on [`TODOS_CATEGORY_FK`].

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;

/// Name of the foreign key from `todos.category_id` to `categories.id`
pub const TODOS_CATEGORY_FK: &str = "todos_category_id_fkey";

/// Category row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    /// Category ID
    pub id: i64,

    /// Display label
    pub label: String,
}

impl Category {
    /// Lists all categories ordered by label
    pub async fn list<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Category>("SELECT id, label FROM categories ORDER BY label, id")
            .fetch_all(executor)
            .await
    }

    /// Finds a category by ID
    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Category>("SELECT id, label FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Creates a category
    pub async fn create<'e, E>(executor: E, label: &str) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (label) VALUES ($1) RETURNING id, label",
        )
        .bind(label.trim())
        .fetch_one(executor)
        .await
    }

    /// Deletes a category
    ///
    /// Returns `false` if no such category exists.
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation if any todo still references it.
    pub async fn delete<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
