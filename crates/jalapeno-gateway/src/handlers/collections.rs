//! Generic collection access.
//!
//! GET /collections                  - list collections (optional graph filter)
//! GET /collections/{name}           - documents, with vertices in scope for graphs
//! GET /collections/{name}/keys      - keys only
//! GET /collections/{name}/info      - normalized metadata
//!
//! Documents pass through opaquely - these endpoints do not interpret
//! vertex or edge schemas beyond the `_from`/`_to` endpoints of graph
//! edges.

use crate::error::ApiError;
use crate::handlers::require_collection;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use jalapeno_kernel::store::ScanOptions;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::BTreeSet;
use tracing::warn;

/// Well-known collection names, used to decide which collections get the
/// graph treatment on the generic endpoint.
pub const KNOWN_GRAPHS: [&str; 4] = ["ipv4_graph", "ipv6_graph", "igpv4_graph", "igpv6_graph"];

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub filter_graphs: Option<bool>,
}

/// GET /collections
///
/// `filter_graphs`: absent shows everything, `true` only `*_graph`
/// collections, `false` only the rest.
pub async fn get_collections(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let collections = state.store.list_collections().await?;
    let filtered: Vec<Value> = collections
        .into_iter()
        .filter(|meta| match query.filter_graphs {
            None => true,
            Some(true) => meta.name.ends_with("_graph"),
            Some(false) => !meta.name.ends_with("_graph"),
        })
        .map(|meta| json!(meta))
        .collect();

    let filter_applied = match query.filter_graphs {
        None => "all",
        Some(true) => "graphs",
        Some(false) => "non_graphs",
    };

    Ok(Json(json!({
        "total_count": filtered.len(),
        "collections": filtered,
        "filter_applied": filter_applied,
    })))
}

#[derive(Debug, Deserialize)]
pub struct DataQuery {
    pub limit: Option<u64>,
    pub skip: Option<u64>,
    pub filter_key: Option<String>,
}

/// GET /collections/{name}
pub async fn get_collection_data(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<DataQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_collection(&state, &name).await?;

    let opts = ScanOptions {
        limit: query.limit,
        skip: query.skip,
        filter_key: query.filter_key,
    };
    let results = state.store.scan(&name, &opts).await?;

    // Graph collections also report the vertices their edges reference.
    if KNOWN_GRAPHS.contains(&name.as_str()) {
        let mut vertex_collections = BTreeSet::new();
        for edge in &results {
            for side in ["_from", "_to"] {
                if let Some(collection) = edge
                    .get(side)
                    .and_then(Value::as_str)
                    .and_then(|id| id.split('/').next())
                {
                    vertex_collections.insert(collection.to_string());
                }
            }
        }

        let mut vertices = Vec::new();
        for collection in &vertex_collections {
            match state.store.scan(collection, &ScanOptions::default()).await {
                Ok(mut docs) => vertices.append(&mut docs),
                Err(err) => {
                    warn!(collection = %collection, error = %err, "could not fetch vertices");
                }
            }
        }

        return Ok(Json(json!({
            "collection": name,
            "type": "graph",
            "edge_count": results.len(),
            "vertex_count": vertices.len(),
            "edges": results,
            "vertices": vertices,
        })));
    }

    Ok(Json(json!({
        "collection": name,
        "type": "collection",
        "count": results.len(),
        "data": results,
    })))
}

/// GET /collections/{name}/keys
pub async fn get_collection_keys(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_collection(&state, &name).await?;
    let keys = state.store.scan_keys(&name).await?;
    Ok(Json(json!({
        "collection": name,
        "key_count": keys.len(),
        "keys": keys,
    })))
}

/// GET /collections/{name}/info
pub async fn get_collection_info(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let meta = state.store.collection_meta(&name).await?;
    Ok(Json(json!(meta)))
}

/// Build the collections router sub-tree.
pub fn router() -> axum::Router<AppState> {
    use axum::routing::get;
    axum::Router::new()
        .route("/collections", get(get_collections))
        .route("/collections/{name}", get(get_collection_data))
        .route("/collections/{name}/keys", get(get_collection_keys))
        .route("/collections/{name}/info", get(get_collection_info))
}
