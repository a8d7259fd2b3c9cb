/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register a new user
/// - `POST /v1/auth/login` - Login and get tokens
/// - `POST /v1/auth/refresh` - Trade a refresh token for an access token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use todolist_shared::{
    auth::{jwt, password},
    models::user::{CreateUser, User},
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (also checked against the strength policy)
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,

    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Tokens issued on register and login
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub user_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,

    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

fn issue_tokens(state: &AppState, user_id: Uuid) -> ApiResult<TokenResponse> {
    let access = jwt::Claims::new(user_id, jwt::TokenType::Access);
    let refresh = jwt::Claims::new(user_id, jwt::TokenType::Refresh);

    Ok(TokenResponse {
        user_id,
        access_token: jwt::create_token(&access, state.jwt_secret())?,
        refresh_token: jwt::create_token(&refresh, state.jwt_secret())?,
        token_type: "Bearer",
        expires_in: jwt::TokenType::Access.default_expiration().num_seconds(),
    })
}

/// Register a new user
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// { "email": "user@example.com", "password": "groceries42", "name": "Sam" }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: Email already exists
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    req.validate()?;

    password::validate_password_strength(&req.password)
        .map_err(|e| ApiError::invalid_field("password", e))?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email.trim().to_string(),
            password_hash,
            name: req.name,
        },
    )
    .await?;

    info!(user_id = %user.id, "Registered user");

    Ok((StatusCode::CREATED, Json(issue_tokens(&state, user.id)?)))
}

/// Login endpoint
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email or wrong password
/// - `422 Unprocessable Entity`: Validation failed
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = User::find_by_email(&state.db, req.email.trim())
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(invalid());
    }

    User::update_last_login(&state.db, user.id).await?;
    info!(user_id = %user.id, "User logged in");

    Ok(Json(issue_tokens(&state, user.id)?))
}

/// Token refresh endpoint
///
/// Only issues a new access token while the account still exists.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid or expired refresh token, or deleted user
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let claims = jwt::validate_refresh_token(&req.refresh_token, state.jwt_secret())?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;

    let access = jwt::Claims::new(user.id, jwt::TokenType::Access);
    let access_token = jwt::create_token(&access, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let ok = RegisterRequest {
            email: "sam@example.com".to_string(),
            password: "groceries42".to_string(),
            name: None,
        };
        assert!(ok.validate().is_ok());

        let bad = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            name: Some("x".repeat(101)),
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("name"));
    }
}
