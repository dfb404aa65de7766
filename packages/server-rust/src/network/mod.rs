//! The HTTP surface: router assembly, shared state, and the serve loop.

pub mod config;
pub mod handlers;
pub mod jsend;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use config::ServerConfig;
pub use jsend::{JSend, JSendStatus};

use crate::series::SeriesRegistry;
use crate::storage::default_retention;

/// State threaded into every handler.
///
/// The registry is owned by the entry point; handlers share it through
/// this clone-cheap handle rather than a process-wide singleton.
#[derive(Clone)]
pub struct AppState {
    /// The live series.
    pub registry: Arc<SeriesRegistry>,
    /// Buffer retention applied to newly created series.
    pub retention: chrono::Duration,
}

impl AppState {
    /// Builds handler state from the entry point's registry and config.
    #[must_use]
    pub fn new(registry: Arc<SeriesRegistry>, config: &ServerConfig) -> Self {
        let retention =
            chrono::Duration::from_std(config.retention).unwrap_or_else(|_| default_retention());
        Self { registry, retention }
    }
}

/// Assembles the application router.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(handlers::ping_handler))
        .route("/series", post(handlers::series_create_handler))
        .route("/series/{id}/points", post(handlers::points_add_handler))
        .route("/series/{id}/query", post(handlers::points_query_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds the listener and serves until ctrl-c.
pub async fn serve(config: &ServerConfig, state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = addr.as_str(), "listening");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to install ctrl-c handler");
    }
}
