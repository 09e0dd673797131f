/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskflow_api::{app::{build_router, AppState}, config::Config};
/// use taskflow_shared::auth::{jwt::{TokenConfig, TokenService}, password::PasswordService};
/// use taskflow_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskflow_shared::store::PgStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig::from_url(config.database.url.clone())).await?;
/// let tokens = TokenService::new(TokenConfig::new(config.jwt.secret.clone()))?;
/// let state = AppState::new(Arc::new(PgStore::new(pool)), tokens, PasswordService::default(), config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, routes};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use taskflow_shared::auth::jwt::TokenService;
use taskflow_shared::auth::middleware::jwt_auth_middleware;
use taskflow_shared::auth::password::PasswordService;
use taskflow_shared::services::ServiceError;
use taskflow_shared::store::Store;
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
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
    pub passwords: PasswordService,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        tokens: TokenService,
        passwords: PasswordService,
        config: Config,
    ) -> Self {
        Self {
            store,
            tokens,
            passwords,
            config: Arc::new(config),
        }
    }

    /// Converts a service failure, exposing store details outside production
    pub fn error(&self, err: ServiceError) -> ApiError {
        ApiError::from_service(err, !self.config.production())
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /health                                   GET     (public)
/// /api/auth/register                        POST    (public)
/// /api/auth/login                           POST    (public)
/// /api/auth/refresh                         POST    (public)
/// /api/auth/me                              GET
/// /api/projects                             GET POST
/// /api/projects/:id                         GET PUT DELETE
/// /api/projects/:id/members                 GET
/// /api/projects/:id/invite                  POST
/// /api/projects/:id/members/:user_id        PUT DELETE
/// /api/projects/:id/tasks                   GET POST
/// /api/tasks                                GET
/// /api/tasks/:id                            GET PUT DELETE
/// /api/admin/users                          GET
/// /api/admin/users/:id                      DELETE
/// ```
///
/// Everything except the public routes sits behind the bearer-token session
/// middleware, applied as a route layer so unknown paths still 404.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/refresh", post(routes::auth::refresh));

    let protected_routes = Router::new()
        .route("/api/auth/me", get(routes::auth::me))
        .route(
            "/api/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/api/projects/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route("/api/projects/:id/members", get(routes::projects::list_members))
        .route("/api/projects/:id/invite", post(routes::projects::invite_member))
        .route(
            "/api/projects/:id/members/:user_id",
            put(routes::projects::update_member_role).delete(routes::projects::remove_member),
        )
        .route(
            "/api/projects/:id/tasks",
            get(routes::tasks::list_project_tasks).post(routes::tasks::create_task),
        )
        .route("/api/tasks", get(routes::tasks::list_my_tasks))
        .route(
            "/api/tasks/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/api/admin/users", get(routes::admin::list_users))
        .route("/api/admin/users/:id", delete(routes::admin::delete_user))
        .route_layer(axum::middleware::from_fn_with_state(
            state.tokens.clone(),
            jwt_auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
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
}
