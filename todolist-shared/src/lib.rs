//! # Todolist Shared Library
//!
//! This crate contains the data model, storage plumbing, and business logic
//! used by the Todolist API server.
//!
//! ## Module Organization
//!
//! - `db`: Connection pool and migrations
//! - `models`: Database models (users, categories, themes, todos)
//! - `auth`: Password hashing, JWT tokens, request auth context
//! - `blob`: Storage for uploaded files
//! - `services`: Todo aggregate operations

pub mod auth;
pub mod blob;
pub mod db;
pub mod models;
pub mod services;

/// Current version of the Todolist shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
