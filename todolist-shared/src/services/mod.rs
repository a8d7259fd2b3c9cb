/// Business operations spanning several models
///
/// - [`todos`]: the Todo aggregate (row, theme set, attached image)

pub mod todos;

pub use todos::{FieldError, TodoError, TodoImage, TodoInput, TodoService, UploadedFile};
