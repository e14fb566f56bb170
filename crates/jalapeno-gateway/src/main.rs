//! Jalapeno API gateway - entry point.
//!
//! Reads configuration from environment variables, connects the ArangoDB
//! store, and serves the axum application.
//!
//! # Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `JALAPENO_database_server` | `http://arangodb:8529` | Graph store base URL. |
//! | `JALAPENO_database_name` | `jalapeno` | Database to open. |
//! | `JALAPENO_username` | `root` | Basic-auth user. |
//! | `JALAPENO_password` | `jalapeno` | Basic-auth password. |
//! | `JALAPENO_API_PORT` | `8000` | TCP port to listen on. |
//! | `JALAPENO_REQUEST_TIMEOUT` | `30` | Per-request deadline in seconds. |
//! | `LOCAL_DEV` | *(unset)* | Any value selects the developer database endpoint. |
//!
//! The process exits non-zero when the database settings are unresolvable.

use jalapeno_gateway::server::{self, ServerConfig};
use jalapeno_gateway::state::AppState;
use jalapeno_graph::{ArangoStore, DbSettings};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("jalapeno_gateway=info".parse().expect("static directive")),
        )
        .init();

    let settings = match DbSettings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("configuration error: {err}");
            std::process::exit(1);
        }
    };

    let store = match ArangoStore::new(&settings) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("could not initialize graph store: {err}");
            std::process::exit(1);
        }
    };

    let port: u16 = std::env::var("JALAPENO_API_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8000);
    let request_timeout = std::env::var("JALAPENO_REQUEST_TIMEOUT")
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(30));

    info!(
        database_server = %settings.database_server,
        database_name = %settings.database_name,
        port,
        "configuration loaded"
    );

    let state = AppState::new(
        Arc::new(store),
        &settings.database_server,
        &settings.database_name,
    );

    let config = ServerConfig {
        port,
        request_timeout,
    };
    if let Err(err) = server::serve(config, state).await {
        eprintln!("server error: {err}");
        std::process::exit(1);
    }
}
