/// Middleware modules for the API server
///
/// Authentication lives in `todolist_shared::auth::middleware` and is wired
/// per route group in `app`.

pub mod security;
