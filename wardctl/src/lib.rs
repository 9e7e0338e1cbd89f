//! # wardctl: Ward Control Layer
//!
//! `wardctl` keeps the bed occupancy of a hospital ward consistent with its
//! admissions, and schedules physician vacations around the duty roster.
//!
//! ## Overview
//!
//! A patient is admitted into exactly one bed at a time. Every move between
//! beds is recorded as an assignment, so the full path of a stay can be
//! reconstructed afterwards. Beds move between `available`, `occupied` and
//! `maintenance`, and an occupied bed always has exactly one open assignment
//! behind it. Physicians book vacations that may neither overlap each other
//! nor cover a day on which they have a shift.
//!
//! ## Architecture
//!
//! The HTTP layer is built on [Axum](https://github.com/tokio-rs/axum) and
//! all state lives in PostgreSQL.
//!
//! The **API layer** ([`api`]) exposes the `/api/v1/*` routes. Handlers parse
//! requests, call one ward operation and map the result into a response.
//!
//! The **ward layer** ([`ward`]) owns the business rules. Each operation runs
//! in a single transaction:
//!
//! - Admissions and bed administration run at READ COMMITTED and take row
//!   locks on every bed they touch, in (room, bed) order.
//! - Vacation writes run at SERIALIZABLE behind a table lock on `shifts`, and
//!   are retried when PostgreSQL reports a serialization failure.
//!
//! The **database layer** ([`db`]) uses the repository pattern. Each table has
//! a repository that borrows a connection, so several repositories can share
//! one transaction.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use wardctl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = wardctl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     wardctl::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
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
//! Migrations run automatically on startup. To run them by hand:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! wardctl::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See [`config`] for the file format and environment overrides.

pub mod api;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
pub mod types;
pub mod ward;

#[cfg(test)]
mod test_utils;

use crate::config::{CorsOrigin, PoolSettings};
use crate::openapi::ApiDoc;
use crate::ward::{AdmissionOrchestrator, BedRegistry, VacationScheduler};
use axum::{
    Json, Router,
    http::HeaderValue,
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Application state shared across all request handlers.
///
/// The ward services are cheap to clone: each one only holds a handle to the
/// shared connection pool.
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool.clone())
///     .config(config)
///     .admissions(AdmissionOrchestrator::new(pool.clone()))
///     .beds(BedRegistry::new(pool.clone()))
///     .vacations(VacationScheduler::new(pool))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub admissions: AdmissionOrchestrator,
    pub beds: BedRegistry,
    pub vacations: VacationScheduler,
}

impl AppState {
    fn from_pool(pool: PgPool, config: Config) -> Self {
        AppState::builder()
            .admissions(AdmissionOrchestrator::new(pool.clone()))
            .beds(BedRegistry::new(pool.clone()))
            .vacations(VacationScheduler::new(pool.clone()))
            .db(pool)
            .config(config)
            .build()
    }
}

/// Get the wardctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

fn pool_options(settings: &PoolSettings) -> PgPoolOptions {
    let mut options = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs));

    // 0 disables the timeout
    options = options.idle_timeout((settings.idle_timeout_secs > 0).then(|| Duration::from_secs(settings.idle_timeout_secs)));
    options = options.max_lifetime((settings.max_lifetime_secs > 0).then(|| Duration::from_secs(settings.max_lifetime_secs)));

    options
}

/// Connect to the configured database and bring its schema up to date
#[instrument(skip_all)]
pub async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    info!("Connecting to database");
    let pool = pool_options(&config.database.pool).connect(&config.database.url).await?;
    migrator().run(&pool).await?;

    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    // A list may not contain `*`, so a wildcard anywhere allows any origin
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
        .allow_credentials(config.cors.allow_credentials);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router: health probe, `/api/v1` routes, OpenAPI
/// document and docs UI, wrapped in CORS and request tracing.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    use api::handlers::{admissions, beds, vacations};

    let api_routes = Router::new()
        // Admissions
        .route(
            "/admissions",
            post(admissions::create_admission).get(admissions::list_admissions),
        )
        .route("/admissions/{id}", get(admissions::get_admission))
        .route("/admissions/{id}/assignments", get(admissions::list_assignments))
        .route("/admissions/{id}/transfer", post(admissions::transfer_admission))
        .route("/admissions/{id}/close", post(admissions::close_admission))
        // Beds
        .route("/beds", get(beds::list_beds).post(beds::create_bed))
        .route("/rooms/{room}/beds/{bed}", get(beds::get_bed).delete(beds::delete_bed))
        .route("/rooms/{room}/beds/{bed}/maintenance", post(beds::set_maintenance))
        .route("/rooms/{room}/beds/{bed}/available", post(beds::set_available))
        // Physicians
        .route(
            "/physicians/{license}/vacations",
            get(vacations::list_vacations).post(vacations::request_vacation),
        )
        .route(
            "/physicians/{license}/vacations/{start_date}",
            axum::routing::put(vacations::update_vacation).delete(vacations::cancel_vacation),
        )
        .route("/physicians/{license}/shifts", get(vacations::list_shifts))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let router = router.layer(create_cors_layer(&state.config)?);

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Owns the router and the connection pool for the lifetime of the process.
///
/// 1. **Create**: [`Application::new`] connects, migrates and builds the router
/// 2. **Serve**: [`Application::serve`] binds the configured address and handles requests
/// 3. **Shutdown**: once the shutdown future resolves, in-flight requests drain,
///    the pool closes and pending spans are flushed
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Like [`Application::new`], but reuses `pool` when given instead of
    /// connecting to `database.url`. Migrations run either way.
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        debug!("Starting ward control layer with configuration: {:#?}", config);

        let pool = match pool {
            Some(pool) => {
                migrator().run(&pool).await?;
                pool
            }
            None => setup_database(&config).await?,
        };

        let state = AppState::from_pool(pool.clone(), config.clone());
        let router = build_router(&state)?;

        Ok(Self { router, config, pool })
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
        info!(
            "Ward control layer listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
