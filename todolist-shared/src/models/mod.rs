/// Database models for Todolist
///
/// This module contains all database models and their queries.
///
/// # Models
///
/// - `user`: User accounts (identity store)
/// - `category`: Required single-valued classification of a todo
/// - `theme`: Optional many-valued tags
/// - `todo`: Task records owned by one user, plus the resolved aggregate view
/// - `todo_theme`: Join rows between todos and themes
///
/// # Relationships
///
/// ```text
/// users 1──* todos *──1 categories
///              │
///              *
///         todo_themes *──1 themes
/// ```

pub mod category;
pub mod theme;
pub mod todo;
pub mod todo_theme;
pub mod user;
