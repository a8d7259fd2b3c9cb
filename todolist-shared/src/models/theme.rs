/// Theme model
///
/// Themes are optional tags attached to todos through `todo_themes`.
/// Deleting a theme removes it from every todo (join rows cascade).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE themes (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(255)
/// );
/// ```

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;

/// Theme row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Theme {
    /// Theme ID
    pub id: i64,

    /// Optional display name
    pub name: Option<String>,
}

impl Theme {
    /// Lists all themes ordered by ID
    pub async fn list<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Theme>("SELECT id, name FROM themes ORDER BY id")
            .fetch_all(executor)
            .await
    }

    /// Finds a theme by ID
    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Theme>("SELECT id, name FROM themes WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Creates a theme
    ///
    /// Blank names are stored as NULL.
    pub async fn create<'e, E>(executor: E, name: Option<&str>) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let name = name.map(str::trim).filter(|n| !n.is_empty());

        sqlx::query_as::<_, Theme>("INSERT INTO themes (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(executor)
            .await
    }

    /// Deletes a theme and, by cascade, all of its todo associations
    pub async fn delete<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM themes WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
