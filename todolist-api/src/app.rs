/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use todolist_api::{app::AppState, config::Config};
/// use todolist_shared::blob::FilesystemBlobStore;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let blobs = Arc::new(FilesystemBlobStore::new(config.storage.upload_dir.clone()));
/// let state = AppState::new(pool, config, blobs);
/// let app = todolist_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use todolist_shared::{auth::middleware::authenticate, blob::BlobStore, services::TodoService};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Todo operations, bound to the configured blob store
    pub todos: TodoService,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            todos: TodoService::new(blobs),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                   # Health check (public)
/// └── /v1/
///     ├── /auth/                # Public
///     │   ├── POST /register
///     │   ├── POST /login
///     │   └── POST /refresh
///     ├── /categories           # Authenticated
///     │   ├── GET, POST   /
///     │   └── GET, DELETE /:id
///     ├── /themes               # Authenticated
///     │   ├── GET, POST   /
///     │   └── GET, DELETE /:id
///     └── /todos                # Authenticated, caller-scoped
///         ├── GET, POST          /
///         ├── GET, PUT, DELETE   /:id
///         └── GET                /:id/image
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication and upload body limit (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let category_routes = Router::new()
        .route(
            "/",
            get(routes::categories::list_categories).post(routes::categories::create_category),
        )
        .route(
            "/:id",
            get(routes::categories::get_category).delete(routes::categories::delete_category),
        );

    let theme_routes = Router::new()
        .route(
            "/",
            get(routes::themes::list_themes).post(routes::themes::create_theme),
        )
        .route(
            "/:id",
            get(routes::themes::get_theme).delete(routes::themes::delete_theme),
        );

    let todo_routes = Router::new()
        .route(
            "/",
            get(routes::todos::list_todos).post(routes::todos::create_todo),
        )
        .route(
            "/:id",
            get(routes::todos::get_todo)
                .put(routes::todos::update_todo)
                .delete(routes::todos::delete_todo),
        )
        .route("/:id/image", get(routes::todos::get_todo_image))
        .layer(DefaultBodyLimit::max(state.config.storage.max_upload_bytes));

    let protected_routes = Router::new()
        .nest("/categories", category_routes)
        .nest("/themes", theme_routes)
        .nest("/todos", todo_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_layer));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    let cors = if state.config.cors_allows_any() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the bearer access token and injects the caller's
/// `AuthContext` into request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(req.headers(), state.jwt_secret())?;
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
