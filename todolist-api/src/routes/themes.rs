/// Theme endpoints
///
/// - `GET    /v1/themes` - List themes
/// - `POST   /v1/themes` - Create a theme
/// - `GET    /v1/themes/:id` - Get one theme
/// - `DELETE /v1/themes/:id` - Delete a theme and its todo associations

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
use todolist_shared::models::theme::Theme;
use tracing::info;
use validator::Validate;

/// Create theme request; the name is optional
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateThemeRequest {
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,
}

pub async fn list_themes(State(state): State<AppState>) -> ApiResult<Json<Vec<Theme>>> {
    Ok(Json(Theme::list(&state.db).await?))
}

pub async fn get_theme(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Theme>> {
    Theme::find_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Theme not found".to_string()))
}

pub async fn create_theme(
    State(state): State<AppState>,
    Json(req): Json<CreateThemeRequest>,
) -> ApiResult<(StatusCode, Json<Theme>)> {
    req.validate()?;

    let theme = Theme::create(&state.db, req.name.as_deref()).await?;
    info!(theme_id = theme.id, "Created theme");

    Ok((StatusCode::CREATED, Json(theme)))
}

pub async fn delete_theme(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !Theme::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Theme not found".to_string()));
    }

    info!(theme_id = id, "Deleted theme");
    Ok(StatusCode::NO_CONTENT)
}
