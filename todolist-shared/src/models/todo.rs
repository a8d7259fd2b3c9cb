/// Todo model and database operations
///
/// A todo is a task record owned by exactly one user. Every query in this
/// module takes the owner as its first predicate: there is no way to read,
/// change, or remove a todo without naming its owner.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE todos (
///     id BIGSERIAL PRIMARY KEY,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     created_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     category_id BIGINT NOT NULL REFERENCES categories(id) ON DELETE RESTRICT,
///     owner_user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     stored_file_name VARCHAR(255),
///     version INTEGER NOT NULL DEFAULT 1
/// );
/// ```
///
/// `created_date` is stamped on insert *and* on every update, so it behaves
/// as a last-modified time. `version` is the optimistic concurrency token:
/// every successful update increments it.

use crate::models::{category::Category, theme::Theme};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Todo row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Todo {
    /// Todo ID
    pub id: i64,

    /// Short title
    pub title: String,

    /// Free-form description
    pub description: String,

    /// Server-assigned timestamp, refreshed on every write
    pub created_date: DateTime<Utc>,

    /// Category (required)
    pub category_id: i64,

    /// Owning user
    pub owner_user_id: Uuid,

    /// Name of the attached blob, if any
    pub stored_file_name: Option<String>,

    /// Row version for optimistic concurrency
    pub version: i32,
}

/// Todo row joined with its category label
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TodoWithCategory {
    #[sqlx(flatten)]
    pub todo: Todo,

    pub category_label: String,
}

/// Input for inserting a todo row
#[derive(Debug, Clone)]
pub struct CreateTodo {
    pub owner_user_id: Uuid,
    pub title: String,
    pub description: String,
    pub category_id: i64,
    pub stored_file_name: Option<String>,
}

/// Input for updating a todo row
///
/// `stored_file_name: None` keeps the current reference.
#[derive(Debug, Clone)]
pub struct UpdateTodo {
    pub title: String,
    pub description: String,
    pub category_id: i64,
    pub stored_file_name: Option<String>,
}

/// A todo with its category and theme set resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoDetail {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub created_date: DateTime<Utc>,
    pub owner_user_id: Uuid,
    pub stored_file_name: Option<String>,
    pub version: i32,
    pub category: Category,
    pub themes: Vec<Theme>,
}

impl TodoDetail {
    /// Builds the aggregate from a joined row and its themes
    pub fn assemble(row: TodoWithCategory, mut themes: Vec<Theme>) -> Self {
        themes.sort_by_key(|t| t.id);

        let TodoWithCategory {
            todo,
            category_label,
        } = row;

        Self {
            id: todo.id,
            title: todo.title,
            description: todo.description,
            created_date: todo.created_date,
            owner_user_id: todo.owner_user_id,
            stored_file_name: todo.stored_file_name,
            version: todo.version,
            category: Category {
                id: todo.category_id,
                label: category_label,
            },
            themes,
        }
    }

    /// IDs of the associated themes
    pub fn theme_ids(&self) -> BTreeSet<i64> {
        self.themes.iter().map(|t| t.id).collect()
    }
}

impl Todo {
    /// Inserts a todo with `created_date = NOW()` and `version = 1`
    pub async fn insert<'e, E>(executor: E, data: CreateTodo) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Todo>(
            r#"
            INSERT INTO todos (title, description, created_date, category_id, owner_user_id, stored_file_name)
            VALUES ($1, $2, NOW(), $3, $4, $5)
            RETURNING id, title, description, created_date, category_id,
                      owner_user_id, stored_file_name, version
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.category_id)
        .bind(data.owner_user_id)
        .bind(data.stored_file_name)
        .fetch_one(executor)
        .await
    }

    /// Finds a todo owned by `owner_user_id`
    pub async fn find_owned<'e, E>(
        executor: E,
        owner_user_id: Uuid,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, title, description, created_date, category_id,
                   owner_user_id, stored_file_name, version
            FROM todos
            WHERE owner_user_id = $1 AND id = $2
            "#,
        )
        .bind(owner_user_id)
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Finds a todo owned by `owner_user_id`, joined with its category
    pub async fn find_owned_with_category<'e, E>(
        executor: E,
        owner_user_id: Uuid,
        id: i64,
    ) -> Result<Option<TodoWithCategory>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, TodoWithCategory>(
            r#"
            SELECT t.id, t.title, t.description, t.created_date, t.category_id,
                   t.owner_user_id, t.stored_file_name, t.version,
                   c.label AS category_label
            FROM todos t
            JOIN categories c ON c.id = t.category_id
            WHERE t.owner_user_id = $1 AND t.id = $2
            "#,
        )
        .bind(owner_user_id)
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Lists every todo owned by `owner_user_id`, joined with its category
    pub async fn list_owned_with_category<'e, E>(
        executor: E,
        owner_user_id: Uuid,
    ) -> Result<Vec<TodoWithCategory>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, TodoWithCategory>(
            r#"
            SELECT t.id, t.title, t.description, t.created_date, t.category_id,
                   t.owner_user_id, t.stored_file_name, t.version,
                   c.label AS category_label
            FROM todos t
            JOIN categories c ON c.id = t.category_id
            WHERE t.owner_user_id = $1
            ORDER BY t.id
            "#,
        )
        .bind(owner_user_id)
        .fetch_all(executor)
        .await
    }

    /// Checks whether a todo with this id is still owned by `owner_user_id`
    pub async fn exists_owned<'e, E>(
        executor: E,
        owner_user_id: Uuid,
        id: i64,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM todos WHERE owner_user_id = $1 AND id = $2)",
        )
        .bind(owner_user_id)
        .bind(id)
        .fetch_one(executor)
        .await
    }

    /// Updates a todo if it is still at `expected_version`
    ///
    /// Refreshes `created_date` and increments `version`. Returns `None` when
    /// no row matched: the todo is gone, owned by someone else, or was
    /// modified since it was read.
    pub async fn update_versioned<'e, E>(
        executor: E,
        owner_user_id: Uuid,
        id: i64,
        expected_version: i32,
        data: UpdateTodo,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Todo>(
            r#"
            UPDATE todos
            SET title = $4,
                description = $5,
                category_id = $6,
                stored_file_name = COALESCE($7, stored_file_name),
                created_date = NOW(),
                version = version + 1
            WHERE owner_user_id = $1 AND id = $2 AND version = $3
            RETURNING id, title, description, created_date, category_id,
                      owner_user_id, stored_file_name, version
            "#,
        )
        .bind(owner_user_id)
        .bind(id)
        .bind(expected_version)
        .bind(data.title)
        .bind(data.description)
        .bind(data.category_id)
        .bind(data.stored_file_name)
        .fetch_optional(executor)
        .await
    }

    /// Deletes a todo owned by `owner_user_id`, returning the removed row
    ///
    /// Join rows in `todo_themes` are removed by cascade.
    pub async fn delete_owned<'e, E>(
        executor: E,
        owner_user_id: Uuid,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Todo>(
            r#"
            DELETE FROM todos
            WHERE owner_user_id = $1 AND id = $2
            RETURNING id, title, description, created_date, category_id,
                      owner_user_id, stored_file_name, version
            "#,
        )
        .bind(owner_user_id)
        .bind(id)
        .fetch_optional(executor)
        .await
    }
}
