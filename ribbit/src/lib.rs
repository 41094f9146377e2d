//! # ribbit: user accounts and IoT device provisioning
//!
//! `ribbit` is a small backend that lets people sign up, log in, and register IoT devices
//! against a third-party device-management API (the *provider*, Golioth by default). Users and
//! the devices provisioned for them are kept in PostgreSQL.
//!
//! ## Overview
//!
//! Request handling is CRUD over two tables. Authentication is an Argon2id password hash plus a
//! signed session cookie. Registering a device means two sequential calls to the provider, one
//! to create the device and one to issue its pre-shared key, followed by a local insert that
//! copies the provider's answers.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum). Handlers receive an [`AppState`]
//! holding a [`db::Store`], a [`provider::DeviceProvider`] and the [`Config`]. Both trait objects
//! are swapped out in tests: the store for [`db::InMemoryStore`], the provider for a client
//! pointed at a mock server.
//!
//! ```text
//! Router ─▶ handler ─┬─▶ auth::{password, session} ─▶ Store
//!                    └─▶ DeviceRegistrar ─▶ DeviceProvider
//!                                        └─▶ Store
//! ```
//!
//! ### Core Components
//!
//! - **API layer** ([`api`]): routes, request/response models
//! - **Authentication** ([`auth`]): password hashing, session tokens, the
//!   [`CurrentUser`](api::models::users::CurrentUser) extractor
//! - **Registration** ([`registration`]): the device provisioning saga
//! - **Provider client** ([`provider`]): reqwest client for the provider API
//! - **Database** ([`db`]): the store trait, PostgreSQL repositories, in-memory store
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use ribbit::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = ribbit::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     ribbit::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config, args.in_memory).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     }).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! Migrations run automatically on startup:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! ribbit::migrator().run(&pool).await?;
//! # Ok(())
//! # }
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
pub mod provider;
pub mod registration;
pub mod telemetry;
pub mod types;

#[cfg(test)]
mod test;

use axum::{
    Router,
    http::{self, HeaderValue},
    routing::{delete, get, post},
};
use bon::Builder;
pub use config::Config;
use db::{InMemoryStore, PostgresStore, Store};
use provider::{DeviceProvider, GoliothClient};
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};

pub use types::{DeviceId, UserId};

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .store(Arc::new(InMemoryStore::new()))
///     .provider(Arc::new(GoliothClient::new(&config.provider)?))
///     .config(config)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub provider: Arc<dyn DeviceProvider>,
    pub config: Config,
}

/// Get the ribbit database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.cors.allowed_origins {
        // Origins never carry a path, so "http://host:port/" must become "http://host:port"
        origins.push(origin.origin().ascii_serialization().parse::<HeaderValue>()?);
    }

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::DELETE])
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_credentials(config.auth.cors.allow_credentials))
}

/// Build the application router with all endpoints, CORS and request tracing.
///
/// # Errors
///
/// Returns an error if the CORS configuration is invalid.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    use api::handlers::{auth, devices, users};

    let cors_layer = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        // Authentication
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout).post(auth::logout))
        // Devices
        .route("/addDevice", post(devices::add_device))
        .route("/devices", get(devices::list_devices))
        .route("/provider/verify", post(devices::verify_provider))
        // Administration
        .route("/users", get(users::list_users))
        .route("/users/{email}", delete(users::delete_user))
        .with_state(state)
        .layer(cors_layer);

    // Add tracing layer
    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Connect to PostgreSQL and bring the schema up to date.
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let url = config
        .database
        .url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("database.url is required unless running in memory"))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(config.database.acquire_timeout)
        .connect(url)
        .await?;
    migrator().run(&pool).await?;

    Ok(pool)
}

pub struct Application {
    router: Router,
    config: Config,
    pool: Option<PgPool>,
}

impl Application {
    /// Create a new application instance with all resources initialized.
    ///
    /// With `in_memory` set, no database is contacted and all data lives in process memory.
    pub async fn new(config: Config, in_memory: bool) -> anyhow::Result<Self> {
        debug!(bind = %config.bind_address(), provider = %config.provider.base_url, "Starting ribbit");

        auth::password::dummy_hash()?;

        let (store, pool): (Arc<dyn Store>, Option<PgPool>) = if in_memory {
            info!("Using in-memory store; data will be lost on shutdown");
            (Arc::new(InMemoryStore::new()), None)
        } else {
            info!("Using PostgreSQL store");
            let pool = setup_database(&config).await?;
            (Arc::new(PostgresStore::new(pool.clone())), Some(pool))
        };

        let provider = Arc::new(GoliothClient::new(&config.provider)?);

        let state = AppState::builder().store(store).provider(provider).config(config).build();
        let mut app = Self::from_state(state)?;
        app.pool = pool;
        Ok(app)
    }

    /// Build an application around already constructed state.
    pub fn from_state(state: AppState) -> anyhow::Result<Self> {
        let config = state.config.clone();
        let router = build_router(state)?;
        Ok(Self { router, config, pool: None })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("ribbit listening on http://{}, available at http://localhost:{}", bind_addr, self.config.port);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
