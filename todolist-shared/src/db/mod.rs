/// PostgreSQL plumbing: the connection pool and the migration runner
///
/// Row types and their queries live in [`crate::models`]; the todo
/// aggregate's transactions live in [`crate::services`].

pub mod migrations;
pub mod pool;
