//! # hostelctl: hostel office administration
//!
//! `hostelctl` keeps the records a hostel office works with day to day: students, the rooms they
//! are assigned to, and the fee payments recorded against them. Staff sign in through a login
//! form and then use a handful of HTML pages backed by a small JSON API.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer and
//! uses SQLite through [sqlx](https://github.com/launchbadge/sqlx) for persistence. The schema is
//! created by embedded migrations on startup. An in-memory database (`sqlite::memory:`) works
//! for demos and is what the tests use.
//!
//! ### Request Flow
//!
//! Public routes (`/`, `/login`, `/logout` and static assets) are served directly. Every other
//! page and all of `/api/*` pass through [`auth::middleware::require_session`], which resolves the
//! session cookie to a [`api::models::users::CurrentUser`] or redirects the browser to `/login`.
//! Handlers then work through the repositories in [`db::handlers`].
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) holds the axum handlers and their request/response models. Errors
//! from any layer end up as [`errors::Error`], rendered as `{"error": "..."}`.
//!
//! The **authentication layer** ([`auth`]) hashes passwords with Argon2, classifies stored
//! credentials (legacy accounts may still hold a plaintext password, which is upgraded on the
//! next login) and manages server-side sessions.
//!
//! The **database layer** ([`db`]) uses the repository pattern. Room occupancy is a counter kept
//! on the room row; it is only changed inside the same transaction that adds or removes a student.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use hostelctl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = hostelctl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     hostelctl::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
mod static_assets;
pub mod telemetry;
mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    api::handlers::{auth as auth_handlers, pages, payments, rooms, stats, students},
    auth::{middleware::require_session, password::Credential},
    config::CorsOrigin,
    db::{
        handlers::{Repository, Users},
        models::users::UserCreateDBRequest,
    },
    openapi::ApiDoc,
};
use axum::{
    Router,
    http::{self, HeaderValue},
    middleware::from_fn_with_state,
    routing::get,
};
use bon::Builder;
pub use config::Config;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::str::FromStr;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{PaymentId, RoomId, StudentId, UserId};

/// Application state shared across all request handlers.
///
/// - `db`: SQLite connection pool for application data
/// - `config`: Application configuration loaded from file and environment
///
/// ```ignore
/// let state = AppState::builder().db(pool).config(config).build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
}

/// Get the hostelctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// An existing account with the same username is left untouched, including its password.
/// Returns the id of the new or existing user.
#[instrument(skip_all, fields(username = %username))]
pub async fn create_initial_admin_user(username: &str, password: &str, db: &SqlitePool) -> anyhow::Result<UserId> {
    let mut conn = db.acquire().await?;
    let mut user_repo = Users::new(&mut conn);

    if let Some(existing) = user_repo.get_by_username(username).await? {
        debug!(user_id = existing.id, "Admin user already exists");
        return Ok(existing.id);
    }

    let credential = Credential::hash(password).map_err(|e| anyhow::anyhow!("Failed to hash admin password: {e}"))?;
    let created = user_repo
        .create(&UserCreateDBRequest {
            username: username.to_string(),
            password_hash: credential.as_stored().to_string(),
        })
        .await?;

    info!(user_id = created.id, "Created initial admin user");
    Ok(created.id)
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Open the connection pool, run migrations and seed the admin account.
pub async fn setup_database(config: &Config) -> anyhow::Result<SqlitePool> {
    let url = &config.database.url;
    let mut pool = config.database.pool.clone();

    // Every connection to an in-memory URL opens its own empty database
    if is_in_memory(url) {
        if pool.max_connections > 1 {
            warn!(
                max_connections = pool.max_connections,
                "In-memory database configured; limiting the pool to a single connection"
            );
        }
        pool.max_connections = 1;
        pool.min_connections = pool.min_connections.min(1);
        pool.idle_timeout = None;
        pool.max_lifetime = None;
        info!("Using in-memory database; data will be lost on shutdown");
    }

    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true).foreign_keys(true);

    let db = SqlitePoolOptions::new()
        .max_connections(pool.max_connections)
        .min_connections(pool.min_connections)
        .acquire_timeout(pool.acquire_timeout)
        .idle_timeout(pool.idle_timeout)
        .max_lifetime(pool.max_lifetime)
        .connect_with(options)
        .await?;

    migrator().run(&db).await?;

    if let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) {
        create_initial_admin_user(username, password, &db).await?;
    }

    Ok(db)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    // A wildcard cannot be mixed into an origin list
    let allow_origin = if config.cors.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::PUT, http::Method::DELETE])
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_credentials(config.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all routes and middleware.
///
/// - Public: `/`, `/login`, `/logout`, `/healthz` and non-HTML static assets
/// - Behind the session gate: the pages, `/api/*` and the API docs at `/api/docs`
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let api_routes = Router::new()
        .route("/stats", get(stats::get_stats))
        .route("/students", get(students::list_students).post(students::create_student))
        .route("/students/{id}", get(students::get_student).delete(students::delete_student))
        .route("/rooms", get(rooms::list_rooms).post(rooms::create_room))
        .route(
            "/rooms/{id}",
            get(rooms::get_room).put(rooms::update_room_status).delete(rooms::delete_room),
        )
        .route("/payments", get(payments::list_payments).post(payments::create_payment))
        .route(
            "/payments/{id}",
            get(payments::get_payment)
                .put(payments::update_payment_status)
                .delete(payments::delete_payment),
        );

    let protected_routes = Router::new()
        .route("/dashboard", get(pages::dashboard))
        .route("/students", get(pages::students))
        .route("/rooms", get(pages::rooms))
        .route("/fees", get(pages::fees))
        .nest("/api", api_routes)
        .merge(Scalar::with_url("/api/docs", ApiDoc::openapi()))
        .route_layer(from_fn_with_state(state.clone(), require_session));

    let public_routes = Router::new()
        .route("/", get(auth_handlers::root_redirect))
        .route("/login", get(auth_handlers::login_page).post(auth_handlers::login))
        .route("/logout", get(auth_handlers::logout))
        .route("/healthz", get(|| async { "OK" }));

    let cors_layer = create_cors_layer(&state.config)?;

    let router = public_routes
        .merge(protected_routes)
        .fallback(pages::serve_asset)
        .with_state(state)
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// The assembled service.
///
/// 1. **Initialize**: [`Application::new`] opens the database, runs migrations, seeds the admin
///    account and builds the router
/// 2. **Serve**: [`Application::serve`] binds the configured address and handles requests until
///    the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!(bind = %config.bind_address(), database = %config.database.url, "Starting hostelctl");

        let pool = setup_database(&config).await?;
        let app_state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(app_state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "hostelctl listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::create_test_config;
    use axum::http::StatusCode;

    fn admin_config() -> Config {
        let mut config = create_test_config();
        config.admin_username = Some("admin".to_string());
        config.admin_password = Some("admin-password".to_string());
        config
    }

    #[test_log::test(tokio::test)]
    async fn test_application_end_to_end() {
        let server = Application::new(admin_config()).await.unwrap().into_test_server();

        // Anything protected bounces to the login page first
        let page = server.get("/students").await;
        page.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(page.header("location"), "/login");

        let login = server
            .post("/login")
            .form(&[("username", "admin"), ("password", "admin-password")])
            .await;
        assert_eq!(login.header("location"), "/dashboard");
        let set_cookie = login.header("set-cookie").to_str().unwrap().to_string();
        let cookie = set_cookie.split(';').next().unwrap().to_string();

        let page = server.get("/students").add_header("cookie", cookie.clone()).await;
        page.assert_status_ok();
        assert!(page.text().contains("Students"));

        server
            .post("/api/rooms")
            .add_header("cookie", cookie.clone())
            .json(&serde_json::json!({ "room_number": "101", "capacity": 2 }))
            .await
            .assert_status_ok();

        let stats: serde_json::Value = server.get("/api/stats").add_header("cookie", cookie.clone()).await.json();
        assert_eq!(stats["totalRooms"], 1);
        assert_eq!(stats["availableRooms"], 1);

        let docs = server.get("/api/docs").add_header("cookie", cookie).await;
        docs.assert_status_ok();

        server.get("/healthz").await.assert_text("OK");
        server.get("/style.css").await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_docs_are_protected() {
        let server = Application::new(create_test_config()).await.unwrap().into_test_server();

        let docs = server.get("/api/docs").await;
        docs.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(docs.header("location"), "/login");
    }

    #[sqlx::test]
    async fn test_create_initial_admin_user_is_idempotent(pool: SqlitePool) {
        let first = create_initial_admin_user("admin", "admin-password", &pool).await.unwrap();
        let second = create_initial_admin_user("admin", "a-different-password", &pool).await.unwrap();
        assert_eq!(first, second);

        let mut conn = pool.acquire().await.unwrap();
        let user = Users::new(&mut conn).get_by_username("admin").await.unwrap().unwrap();
        let credential = Credential::from_stored(user.password);
        assert!(!credential.is_legacy());
        assert!(credential.verify("admin-password", false).unwrap().is_match());
        assert!(!credential.verify("a-different-password", false).unwrap().is_match());
    }

    #[tokio::test]
    async fn test_in_memory_pool_is_single_connection() {
        let mut config = create_test_config();
        config.database.pool.max_connections = 8;

        let pool = setup_database(&config).await.unwrap();
        assert_eq!(pool.options().get_max_connections(), 1);
    }

    #[tokio::test]
    async fn test_file_database_is_created_and_migrated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hostel.db");

        let mut config = admin_config();
        config.database.url = format!("sqlite://{}", path.display());
        config.database.pool.max_connections = 4;

        let pool = setup_database(&config).await.unwrap();
        assert!(path.exists());
        assert_eq!(pool.options().get_max_connections(), 4);

        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(&pool).await.unwrap();
        assert_eq!(users, 1);

        // Foreign keys are enforced on every connection
        let orphan = sqlx::query("INSERT INTO students (name, email, roll_number, room_number, created_at) VALUES ('x', 'x@example.com', 'X-1', 'nowhere', '2025-01-01T00:00:00Z')")
            .execute(&pool)
            .await;
        assert!(orphan.is_err());
        pool.close().await;
    }

    #[test]
    fn test_cors_layer_from_config() {
        let mut config = create_test_config();
        config.cors.allowed_origins = vec![CorsOrigin::Url("https://office.example.com/".parse().unwrap())];
        assert!(create_cors_layer(&config).is_ok());

        config.cors.allowed_origins = vec![CorsOrigin::Wildcard];
        config.cors.allow_credentials = false;
        assert!(create_cors_layer(&config).is_ok());
    }
}
