use std::sync::Arc;

use axum::{
    routing::{get, put},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

mod config;
mod db;
mod error;
mod handlers;
mod metrics;
mod models;
#[cfg(test)]
mod test_support;

use crate::config::Config;
use crate::db::{ItemStore, MySqlItemStore};
use crate::metrics::MetricsEmitter;

/// Shared application state, cheap to clone (all heap behind Arc).
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ItemStore>,
    pub metrics: MetricsEmitter,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (ignored in production where env vars are injected)
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,items_service=debug".into()),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;

    info!(
        host = %config.database.host,
        port = config.database.port,
        database = %config.database.name,
        "Preparing items table..."
    );
    let store = MySqlItemStore::new(&config.database);
    if let Err(err) = store.bootstrap().await {
        error!(error = %err, "Database bootstrap failed, refusing to serve");
        return Err(err.into());
    }
    info!("Items table created and truncated.");

    let metrics = MetricsEmitter::from_config(&config.metrics)?;
    match &config.metrics.endpoint {
        Some(endpoint) => info!(%endpoint, delivery = ?config.metrics.delivery, "Sending latency metrics"),
        None => info!("No METRICS_ENDPOINT set, latency metrics are only logged"),
    }

    let state = AppState {
        store: Arc::new(store),
        metrics,
    };

    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // ── Health ──────────────────────────────────────────────────────────
        .route("/health", get(handlers::health))

        // ── Items CRUD ──────────────────────────────────────────────────────
        .route(
            "/api/items",
            get(handlers::items::list_items).post(handlers::items::create_item),
        )
        .route(
            "/api/items/:id",
            put(handlers::items::update_item).delete(handlers::items::delete_item),
        )

        // ── Latency history ─────────────────────────────────────────────────
        .route("/api/metrics/latency", get(handlers::metrics::latency_report))

        .fallback(handlers::not_found)

        // ── Middleware ──────────────────────────────────────────────────────
        .layer(CatchPanicLayer::custom(handlers::handle_panic))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Signal received, starting graceful shutdown");
}
