/// Category endpoints
///
/// Categories are shared reference data used to populate todo forms.
///
/// - `GET    /v1/categories` - List categories
/// - `POST   /v1/categories` - Create a category
/// - `GET    /v1/categories/:id` - Get one category
/// - `DELETE /v1/categories/:id` - Delete a category (409 while any todo uses it)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use todolist_shared::models::category::Category;
use tracing::info;
use validator::Validate;

/// Create category request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 255, message = "Label must be 1-255 characters"))]
    pub label: String,
}

/// List all categories
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(Category::list(&state.db).await?))
}

/// Get one category
///
/// # Errors
///
/// - `404 Not Found`: No such category
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Category>> {
    Category::find_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))
}

/// Create a category
pub async fn create_category(
    State(state): State<AppState>,
    Json(req): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    req.validate()?;

    if req.label.trim().is_empty() {
        return Err(ApiError::invalid_field("label", "Label must not be blank"));
    }

    let category = Category::create(&state.db, &req.label).await?;
    info!(category_id = category.id, "Created category");

    Ok((StatusCode::CREATED, Json(category)))
}

/// Delete a category
///
/// # Errors
///
/// - `404 Not Found`: No such category
/// - `409 Conflict`: Category is still referenced by a todo
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !Category::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Category not found".to_string()));
    }

    info!(category_id = id, "Deleted category");
    Ok(StatusCode::NO_CONTENT)
}
