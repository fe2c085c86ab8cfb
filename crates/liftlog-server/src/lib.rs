//! liftlog HTTP server library.

pub mod api_admin;
pub mod api_auth;
pub mod api_reset;
pub mod api_training;
pub mod config;
pub mod gate;
pub mod notify;
pub mod respond;
pub mod validate;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use liftlog_admin::SchemaCache;
use liftlog_db::DbPool;
use liftlog_training::CatalogCache;
use notify::ResetNotifier;
use respond::ApiError;
use rusqlite::Connection;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Admin allow-list, rebuilt each time the admin gate is passed.
    pub schema: Arc<SchemaCache>,
    /// Exercise catalog, rebuilt after admin writes to `exercise`.
    pub catalog: Arc<CatalogCache>,
    pub notifier: ResetNotifier,
    /// Built web client to serve as the fallback route.
    pub client_dir: String,
}

impl AppState {
    pub fn new(pool: DbPool, notifier: ResetNotifier, client_dir: impl Into<String>) -> Self {
        Self {
            pool,
            schema: Arc::new(SchemaCache::new()),
            catalog: Arc::new(CatalogCache::new()),
            notifier,
            client_dir: client_dir.into(),
        }
    }
}

/// Runs `f` on a pooled connection on the blocking thread pool.
pub(crate) async fn with_conn<T, F>(state: &Arc<AppState>, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Connection) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let pool = state.pool.clone();
    tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|e| {
            tracing::error!(error = %e, "db connection failed");
            ApiError::Internal
        })?;
        f(&*conn)
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "blocking db task failed");
        ApiError::Internal
    })?
}

/// Maximum request body size (1 MiB).
const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let account_routes = Router::new()
        .route("/api/user", get(api_auth::user_details_handler))
        .route("/api/login", post(api_auth::login_handler))
        .route("/api/signup", post(api_auth::signup_handler))
        .route("/api/reset", post(api_reset::redeem_handler))
        .route("/api/reset/generate", post(api_reset::generate_handler))
        .route("/api/reset/validate", post(api_reset::validate_handler));

    let training_routes = Router::new()
        .route("/api/exercises", get(api_training::exercises_handler))
        .route("/api/user/muscles", post(api_training::muscles_handler))
        .route("/api/workouts/save", post(api_training::save_workout_handler))
        .route("/api/workouts/finish", post(api_training::finish_workout_handler))
        .route(
            "/api/workouts/finished",
            get(api_training::finished_dates_handler),
        )
        .route("/api/workouts/dates", post(api_training::month_dates_handler))
        .route("/api/workouts/data", post(api_training::day_workouts_handler))
        .route("/api/templates", get(api_training::templates_handler))
        .route("/api/templates/save", post(api_training::save_template_handler))
        .route(
            "/api/templates/delete",
            post(api_training::delete_template_handler),
        )
        .route("/api/diet", post(api_training::diet_handler))
        .route("/api/diet/add", post(api_training::add_diet_handler));

    let admin_routes = Router::new()
        .route("/api/admin/tables", get(api_admin::tables_handler))
        .route("/api/admin/data", post(api_admin::data_handler))
        .route("/api/admin/update", post(api_admin::update_handler))
        .route("/api/admin/delete", post(api_admin::delete_handler))
        .route("/api/admin/insert", post(api_admin::insert_handler));

    let router = Router::new()
        .route("/health", get(health))
        .merge(account_routes)
        .merge(training_routes)
        .merge(admin_routes);

    let client_dir = state.client_dir.clone();
    let router = if Path::new(&client_dir).join("index.html").exists() {
        tracing::info!(path = %client_dir, "serving client static files");
        let index = Path::new(&client_dir).join("index.html");
        router.fallback_service(ServeDir::new(&client_dir).fallback(ServeFile::new(index)))
    } else {
        tracing::info!(path = %client_dir, "client directory not found, skipping static file serving");
        router
    };

    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
