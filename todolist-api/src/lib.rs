//! # Todolist API Server Library
//!
//! HTTP surface for the Todolist service: a user's todos with a category,
//! any number of themes, and an optional uploaded image.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Response security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
