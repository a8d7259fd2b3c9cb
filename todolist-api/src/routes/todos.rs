/// Todo endpoints
///
/// # Endpoints
///
/// - `GET    /v1/todos` - List the caller's todos
/// - `POST   /v1/todos` - Create a todo (multipart/form-data)
/// - `GET    /v1/todos/:id` - Get one todo
/// - `PUT    /v1/todos/:id` - Edit a todo (multipart/form-data)
/// - `DELETE /v1/todos/:id` - Delete a todo (204 even when absent)
/// - `GET    /v1/todos/:id/image` - Download the attached image
///
/// # Form fields
///
/// | Field | Notes |
/// |---|---|
/// | `title` | required |
/// | `description` | required |
/// | `category_id` | required integer |
/// | `theme_ids` | repeatable, or one comma-separated value |
/// | `version` | edit only; last version the client saw |
/// | `file` | optional image |

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use todolist_shared::{
    auth::middleware::AuthContext,
    models::{category::Category, theme::Theme, todo::TodoDetail},
    services::{TodoInput, UploadedFile},
};

/// Todo as returned by the API
#[derive(Debug, Serialize)]
pub struct TodoResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub created_date: DateTime<Utc>,
    pub category: Category,
    pub themes: Vec<Theme>,
    pub stored_file_name: Option<String>,

    /// Download path of the attached image
    pub image_url: Option<String>,

    pub version: i32,
}

impl From<TodoDetail> for TodoResponse {
    fn from(todo: TodoDetail) -> Self {
        let image_url = todo
            .stored_file_name
            .as_ref()
            .map(|_| format!("/v1/todos/{}/image", todo.id));

        Self {
            id: todo.id,
            title: todo.title,
            description: todo.description,
            created_date: todo.created_date,
            category: todo.category,
            themes: todo.themes,
            stored_file_name: todo.stored_file_name,
            image_url,
            version: todo.version,
        }
    }
}

/// Parsed multipart form
#[derive(Debug, Default)]
struct TodoForm {
    input: TodoInput,
    file: Option<UploadedFile>,
}

/// List the caller's todos
pub async fn list_todos(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<TodoResponse>>> {
    let todos = state.todos.list(&state.db, auth.user_id).await?;
    Ok(Json(todos.into_iter().map(TodoResponse::from).collect()))
}

/// Get one of the caller's todos
pub async fn get_todo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TodoResponse>> {
    let todo = state.todos.get(&state.db, auth.user_id, id).await?;
    Ok(Json(todo.into()))
}

/// Create a todo
///
/// # Errors
///
/// - `400 Bad Request`: Malformed multipart body
/// - `422 Unprocessable Entity`: Invalid fields, unknown category or theme
pub async fn create_todo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<TodoResponse>)> {
    let form = read_form(multipart).await?;

    let todo = state
        .todos
        .create(&state.db, auth.user_id, form.input, form.file)
        .await?;

    Ok((StatusCode::CREATED, Json(todo.into())))
}

/// Edit a todo
///
/// Replaces the theme set with the submitted one. Omitting `file` keeps the
/// current image.
///
/// # Errors
///
/// - `404 Not Found`: No such todo for this user
/// - `409 Conflict`: `version` is stale
/// - `422 Unprocessable Entity`: Invalid fields
pub async fn update_todo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> ApiResult<Json<TodoResponse>> {
    let form = read_form(multipart).await?;

    let todo = state
        .todos
        .update(&state.db, auth.user_id, id, form.input, form.file)
        .await?;

    Ok(Json(todo.into()))
}

/// Delete a todo
pub async fn delete_todo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.todos.delete(&state.db, auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Download a todo's image
pub async fn get_todo_image(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    let image = state.todos.read_image(&state.db, auth.user_id, id).await?;

    Ok((
        [(header::CONTENT_TYPE, content_type_for(&image.stored_file_name))],
        image.bytes,
    )
        .into_response())
}

async fn read_form(mut multipart: Multipart) -> ApiResult<TodoForm> {
    let mut form = TodoForm::default();
    let mut errors = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "file" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?;

            // Browsers send an empty part when no file was chosen
            if !(file_name.is_empty() && bytes.is_empty()) {
                form.file = Some(UploadedFile {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?;

        if let Err(detail) = apply_field(&mut form.input, &name, &value) {
            errors.push(detail);
        }
    }

    if !errors.is_empty() {
        return Err(ApiError::ValidationError(errors));
    }
    Ok(form)
}

/// Applies one text field to the input; unknown fields are ignored
fn apply_field(input: &mut TodoInput, name: &str, value: &str) -> Result<(), ValidationErrorDetail> {
    let invalid = |message: &str| ValidationErrorDetail {
        field: name.to_string(),
        message: message.to_string(),
    };

    match name {
        "title" => input.title = value.to_string(),
        "description" => input.description = value.to_string(),
        "category_id" => {
            input.category_id = value
                .trim()
                .parse()
                .map_err(|_| invalid("Category must be an integer id"))?;
        }
        "theme_ids" | "theme_ids[]" => {
            let ids = parse_id_list(value).ok_or_else(|| invalid("Theme ids must be integers"))?;
            input.theme_ids.extend(ids);
        }
        "version" => {
            let value = value.trim();
            if !value.is_empty() {
                input.expected_version = Some(
                    value
                        .parse()
                        .map_err(|_| invalid("Version must be an integer"))?,
                );
            }
        }
        _ => {}
    }
    Ok(())
}

/// Parses `"1, 2,3"`; blank entries are skipped
fn parse_id_list(value: &str) -> Option<Vec<i64>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i64>().ok())
        .collect()
}

fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
