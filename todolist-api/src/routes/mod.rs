/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, refresh)
/// - `categories`: Category catalog
/// - `themes`: Theme catalog
/// - `todos`: Todo CRUD and image download

pub mod auth;
pub mod categories;
pub mod health;
pub mod themes;
pub mod todos;
