//! Edge-collection inventory.
//!
//! GET /instances - names of all edge collections (the routable graphs)

use crate::error::ApiError;
use crate::state::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use jalapeno_kernel::entity::CollectionKind;

/// GET /instances
pub async fn get_instances(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let collections = state.store.list_collections().await?;
    let names: Vec<String> = collections
        .into_iter()
        .filter(|meta| meta.kind == CollectionKind::Edge)
        .map(|meta| meta.name)
        .collect();
    Ok(Json(names))
}

/// Build the instances router sub-tree.
pub fn router() -> axum::Router<AppState> {
    use axum::routing::get;
    axum::Router::new().route("/instances", get(get_instances))
}
