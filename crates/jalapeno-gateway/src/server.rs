//! Router assembly and serving.
//!
//! The router mounts `/health` at the root and everything else under
//! `/api/v1`, then wraps the tree in the shared layers: request tracing,
//! permissive CORS (the API fronts browser-based controllers), and the
//! per-request deadline. When the deadline elapses the in-flight graph
//! store call is dropped and the client sees a timeout status; load
//! updates already applied stay applied.

use crate::handlers;
use crate::state::AppState;
use axum::Router;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Runtime configuration for the gateway server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on.
    pub port: u16,
    /// Per-request deadline.
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: 8000,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Build the full application router.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .merge(handlers::health::router())
        .nest("/api/v1", handlers::api_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}

/// Bind and serve until the process exits.
pub async fn serve(config: ServerConfig, state: AppState) -> std::io::Result<()> {
    let app = build_router(state, config.request_timeout);
    let addr = format!("0.0.0.0:{}", config.port);
    info!(addr = %addr, "Jalapeno API gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await
}
