//! Liveness probe.
//!
//! GET /health - server is up; reports the configured database target

use crate::state::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

/// GET /health
///
/// Always `200 OK` while the process is alive. The database is not probed
/// here - readiness of the store shows up on the first real query.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "database_server": state.database_server,
        "database_name": state.database_name,
    }))
}

/// Build the health router sub-tree (mounted outside `/api/v1`).
pub fn router() -> axum::Router<AppState> {
    use axum::routing::get;
    axum::Router::new().route("/health", get(health))
}
