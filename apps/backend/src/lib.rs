pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use review_core::Sm2Scheduler;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::services::sessions::{spawn_pruner, SessionRegistry};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub scheduler: Sm2Scheduler,
    pub sessions: Arc<SessionRegistry<Database>>,
}

impl AppState {
    pub fn new(db: Database, session_idle_ttl: Duration) -> Self {
        Self {
            db: Arc::new(db),
            scheduler: Sm2Scheduler::default(),
            sessions: Arc::new(SessionRegistry::new(session_idle_ttl)),
        }
    }
}

/// Build the full router with all routes.
pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        // Learner routes
        .route("/api/learner/status", get(routes::learner::status))
        // Deck routes
        .route(
            "/api/decks",
            get(routes::decks::list).post(routes::decks::create),
        )
        .route("/api/decks/:deck_id/due-count", get(routes::decks::due_count))
        // Study routes
        .route("/api/study/review", post(routes::study::review))
        .route("/api/study/due-count", post(routes::study::due_count))
        // Session routes
        .route("/api/sessions", post(routes::sessions::open))
        .route(
            "/api/sessions/:session_id",
            get(routes::sessions::get).delete(routes::sessions::abandon),
        )
        .route("/api/sessions/:session_id/rate", post(routes::sessions::rate))
        .route(
            "/api/sessions/:session_id/restart",
            post(routes::sessions::restart),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/learner/register", post(routes::learner::register))
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url, config.max_connections).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    let state = AppState::new(db, config.session_idle_ttl);
    spawn_pruner(state.sessions.clone());
    let app = router(state);

    let addr = config.bind_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
