/// Todo ↔ Theme join rows
///
/// Pure association rows with a composite primary key. They have no life of
/// their own: they are written only as part of a todo's theme-set mutation
/// and disappear by cascade when either side is deleted.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE todo_themes (
///     todo_id BIGINT NOT NULL REFERENCES todos(id) ON DELETE CASCADE,
///     theme_id BIGINT NOT NULL REFERENCES themes(id) ON DELETE CASCADE,
///     PRIMARY KEY (todo_id, theme_id)
/// );
/// ```

use crate::models::theme::Theme;
use sqlx::postgres::{PgConnection, PgExecutor};
use std::collections::{HashMap, HashSet};

/// Name of the foreign key from `todo_themes.theme_id` to `themes.id`
pub const TODO_THEMES_THEME_FK: &str = "todo_themes_theme_id_fkey";

/// Join row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::FromRow)]
pub struct TodoTheme {
    pub todo_id: i64,
    pub theme_id: i64,
}

/// Join row with the theme's name resolved
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TodoThemeWithName {
    pub todo_id: i64,
    pub theme_id: i64,
    pub theme_name: Option<String>,
}

impl TodoTheme {
    /// Associates `todo_id` with every theme in `theme_ids`
    ///
    /// Duplicate IDs are collapsed; an empty slice is a no-op.
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation on [`TODO_THEMES_THEME_FK`] if a
    /// theme does not exist.
    pub async fn insert_many<'e, E>(
        executor: E,
        todo_id: i64,
        theme_ids: &[i64],
    ) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        if theme_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO todo_themes (todo_id, theme_id)
            SELECT DISTINCT $1, theme_id
            FROM UNNEST($2::BIGINT[]) AS theme_id
            ON CONFLICT (todo_id, theme_id) DO NOTHING
            "#,
        )
        .bind(todo_id)
        .bind(theme_ids.to_vec())
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Removes every association of `todo_id`
    pub async fn delete_for_todo<'e, E>(executor: E, todo_id: i64) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM todo_themes WHERE todo_id = $1")
            .bind(todo_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Replaces the full theme set of `todo_id`
    ///
    /// Delete-all-then-insert; run it inside the transaction that updates the
    /// todo row.
    pub async fn replace_for_todo(
        conn: &mut PgConnection,
        todo_id: i64,
        theme_ids: &[i64],
    ) -> Result<(), sqlx::Error> {
        Self::delete_for_todo(&mut *conn, todo_id).await?;
        Self::insert_many(&mut *conn, todo_id, theme_ids).await?;
        Ok(())
    }

    /// Loads the themes of several todos in one query
    pub async fn themes_for_todos<'e, E>(
        executor: E,
        todo_ids: &[i64],
    ) -> Result<Vec<TodoThemeWithName>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        if todo_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, TodoThemeWithName>(
            r#"
            SELECT tt.todo_id, tt.theme_id, th.name AS theme_name
            FROM todo_themes tt
            JOIN themes th ON th.id = tt.theme_id
            WHERE tt.todo_id = ANY($1)
            ORDER BY tt.todo_id, tt.theme_id
            "#,
        )
        .bind(todo_ids.to_vec())
        .fetch_all(executor)
        .await
    }
}

/// Groups join rows into per-todo theme lists
pub fn group_by_todo(rows: Vec<TodoThemeWithName>) -> HashMap<i64, Vec<Theme>> {
    let mut grouped: HashMap<i64, Vec<Theme>> = HashMap::new();
    for row in rows {
        grouped.entry(row.todo_id).or_default().push(Theme {
            id: row.theme_id,
            name: row.theme_name,
        });
    }
    grouped
}

/// Collapses duplicate theme IDs, keeping first-seen order
pub fn distinct_theme_ids(theme_ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::with_capacity(theme_ids.len());
    theme_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_theme_ids_keeps_first_occurrence() {
        assert_eq!(distinct_theme_ids(&[2, 1, 2, 3, 1]), vec![2, 1, 3]);
        assert!(distinct_theme_ids(&[]).is_empty());
    }

    #[test]
    fn test_group_by_todo() {
        let rows = vec![
            TodoThemeWithName { todo_id: 1, theme_id: 10, theme_name: Some("home".into()) },
            TodoThemeWithName { todo_id: 2, theme_id: 10, theme_name: Some("home".into()) },
            TodoThemeWithName { todo_id: 1, theme_id: 11, theme_name: None },
        ];

        let grouped = group_by_todo(rows);

        assert_eq!(grouped.len(), 2);
        assert_eq!(
            grouped[&1],
            vec![
                Theme { id: 10, name: Some("home".into()) },
                Theme { id: 11, name: None },
            ]
        );
        assert_eq!(grouped[&2].len(), 1);
        assert!(!grouped.contains_key(&3));
    }
}
