//! Graph collection inventory and topology projections.
//!
//! GET /graphs                                    - graph collection listing
//! GET /graphs/{name}                             - one graph's summary
//! GET /graphs/{name}/info                        - metadata + vertex collections
//! GET /graphs/{name}/vertices                    - vertex inventory by collection
//! GET /graphs/{name}/vertices/keys               - distinct vertex keys
//! GET /graphs/{name}/vertices/ids                - distinct vertex id/key pairs
//! GET /graphs/{name}/vertices/algo               - vertices participating in an algo
//! GET /graphs/{name}/vertices/summary            - compact vertex view
//! GET /graphs/{name}/edges                       - edge endpoints only
//! GET /graphs/{name}/edges/detail                - edge metrics and properties
//! GET /graphs/{name}/topology                    - full subgraph
//! GET /graphs/{name}/topology/nodes              - node-to-node subgraph
//! GET /graphs/{name}/topology/nodes/algo         - algo-constrained node subgraph

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
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn edge_endpoint<'a>(edge: &'a Value, side: &str) -> Option<&'a str> {
    edge.get(side).and_then(Value::as_str)
}

/// Vertex collections referenced by a set of edges.
fn vertex_collections(edges: &[Value]) -> BTreeSet<String> {
    let mut collections = BTreeSet::new();
    for edge in edges {
        for side in ["_from", "_to"] {
            if let Some(collection) = edge_endpoint(edge, side).and_then(|id| id.split('/').next())
            {
                collections.insert(collection.to_string());
            }
        }
    }
    collections
}

/// Distinct vertex ids referenced by a set of edges, in first-seen order.
fn vertex_ids(edges: &[Value]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut ids = Vec::new();
    for edge in edges {
        for side in ["_from", "_to"] {
            if let Some(id) = edge_endpoint(edge, side) {
                if seen.insert(id.to_string()) {
                    ids.push(id.to_string());
                }
            }
        }
    }
    ids
}

/// Strip null-valued fields, the way the compact views are served.
fn without_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, without_nulls(v)))
                .collect(),
        ),
        other => other,
    }
}

async fn fetch_vertex(state: &AppState, id: &str) -> Option<Value> {
    let (collection, key) = id.split_once('/')?;
    match state.store.get_document(collection, key).await {
        Ok(doc) => doc,
        Err(err) => {
            warn!(vertex = id, error = %err, "error getting vertex");
            None
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Collection routes
// ─────────────────────────────────────────────────────────────────────────────

/// GET /graphs
pub async fn get_graphs(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let collections = state.store.list_collections().await?;
    let graphs: Vec<Value> = collections
        .into_iter()
        .filter(|meta| meta.name.ends_with("_graph"))
        .map(|meta| json!(meta))
        .collect();
    Ok(Json(json!({
        "total_count": graphs.len(),
        "collections": graphs,
    })))
}

/// GET /graphs/{name}
pub async fn get_graph(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_collection(&state, &name).await?;
    if !name.ends_with("_graph") {
        return Err(ApiError::Validation(format!(
            "Collection {name} is not a graph collection"
        )));
    }
    let meta = state.store.collection_meta(&name).await?;
    Ok(Json(json!(meta)))
}

/// GET /graphs/{name}/info
pub async fn get_graph_info(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_collection(&state, &name).await?;
    if !name.ends_with("_graph") {
        return Err(ApiError::Validation(format!(
            "Collection {name} is not a graph collection"
        )));
    }
    let meta = state.store.collection_meta(&name).await?;
    let edges = state.store.edge_connections(&name, false).await?;
    Ok(Json(json!({
        "name": name,
        "type": meta.kind,
        "status": meta.status,
        "count": meta.count,
        "vertex_collections": vertex_collections(&edges),
    })))
}

// ─────────────────────────────────────────────────────────────────────────────
// Vertex routes
// ─────────────────────────────────────────────────────────────────────────────

/// GET /graphs/{name}/vertices
pub async fn get_vertices(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_collection(&state, &name).await?;
    let edges = state.store.edge_connections(&name, false).await?;
    let collections = vertex_collections(&edges);

    let mut by_collection: Map<String, Value> = Map::new();
    let mut total = 0usize;
    for collection in &collections {
        match state.store.scan(collection, &ScanOptions::default()).await {
            Ok(docs) => {
                let vertices: Vec<Value> = docs
                    .iter()
                    .map(|doc| {
                        json!({
                            "_id": doc.get("_id"),
                            "_key": doc.get("_key"),
                            "collection": collection,
                        })
                    })
                    .collect();
                total += vertices.len();
                by_collection.insert(collection.clone(), json!(vertices));
            }
            Err(err) => {
                warn!(collection = %collection, error = %err, "error processing vertex collection");
                by_collection.insert(collection.clone(), json!({ "error": err.to_string() }));
            }
        }
    }

    Ok(Json(json!({
        "collection": name,
        "vertex_collections": collections,
        "total_vertices": total,
        "vertices_by_collection": by_collection,
    })))
}

/// GET /graphs/{name}/vertices/keys
pub async fn get_vertex_keys(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_collection(&state, &name).await?;
    let edges = state.store.edge_connections(&name, false).await?;
    // BTreeSet both dedupes and sorts.
    let keys: Vec<String> = vertex_ids(&edges)
        .iter()
        .filter_map(|id| id.split('/').nth(1).map(str::to_string))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    Ok(Json(json!({
        "collection": name,
        "vertex_count": keys.len(),
        "vertex_keys": keys,
    })))
}

/// GET /graphs/{name}/vertices/ids
pub async fn get_vertex_ids(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_collection(&state, &name).await?;
    let edges = state.store.edge_connections(&name, false).await?;
    let mut vertices: Vec<Value> = vertex_ids(&edges)
        .iter()
        .map(|id| {
            json!({
                "_id": id,
                "_key": id.split('/').nth(1).unwrap_or_default(),
            })
        })
        .collect();
    vertices.sort_by(|a, b| {
        a["_key"]
            .as_str()
            .unwrap_or_default()
            .cmp(b["_key"].as_str().unwrap_or_default())
    });
    Ok(Json(json!({
        "collection": name,
        "vertex_count": vertices.len(),
        "vertices": vertices,
    })))
}

#[derive(Debug, Deserialize)]
pub struct AlgoQuery {
    #[serde(default)]
    pub algo: u32,
}

/// GET /graphs/{name}/vertices/algo
pub async fn get_vertices_by_algo(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<AlgoQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_collection(&state, &name).await?;
    let vertices = state.store.vertices_by_algo(&name, query.algo, false).await?;

    let mut by_collection: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    for vertex in &vertices {
        by_collection
            .entry(vertex.collection.clone())
            .or_default()
            .push(json!(vertex));
    }
    let collection_names: Vec<String> = by_collection.keys().cloned().collect();

    Ok(Json(json!({
        "graph_collection": name,
        "algo": query.algo,
        "total_vertices": vertices.len(),
        "vertex_collections": collection_names,
        "vertices_by_collection": by_collection,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub limit: Option<u64>,
    pub vertex_collection: Option<String>,
}

/// GET /graphs/{name}/vertices/summary
pub async fn get_vertex_summary(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<SummaryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_collection(&state, &name).await?;
    let edges = state.store.edge_connections(&name, false).await?;
    let collections = vertex_collections(&edges);
    if collections.is_empty() {
        return Err(ApiError::NotFound(format!(
            "No vertex collections found for graph {name}"
        )));
    }

    if let Some(filter) = &query.vertex_collection {
        if !collections.contains(filter) {
            return Err(ApiError::Validation(format!(
                "Vertex collection '{filter}' not found in graph. Available collections: {collections:?}"
            )));
        }
    }

    let targets: Vec<&String> = match &query.vertex_collection {
        Some(filter) => vec![filter],
        None => collections.iter().collect(),
    };

    let limit = query.limit.unwrap_or(100);
    let mut vertices = Vec::new();
    for collection in targets {
        let docs = state
            .store
            .scan(
                collection,
                &ScanOptions {
                    limit: Some(limit),
                    ..Default::default()
                },
            )
            .await?;
        for doc in docs {
            let sids: Option<Vec<Value>> = doc.get("sids").and_then(Value::as_array).map(|sids| {
                sids.iter()
                    .map(|sid| sid.get("srv6_sid").cloned().unwrap_or(Value::Null))
                    .collect()
            });
            vertices.push(without_nulls(json!({
                "collection": collection,
                "_key": doc.get("_key"),
                "_id": doc.get("_id"),
                "name": doc.get("name"),
                "prefix": doc.get("prefix"),
                "sids": sids,
                "protocol": doc.get("protocol"),
                "asn": doc.get("asn"),
            })));
        }
    }

    Ok(Json(json!({
        "graph": name,
        "vertex_collections": collections,
        "filtered_collection": query.vertex_collection,
        "total_vertices": vertices.len(),
        "vertices": vertices,
    })))
}

// ─────────────────────────────────────────────────────────────────────────────
// Edge routes
// ─────────────────────────────────────────────────────────────────────────────

/// GET /graphs/{name}/edges
pub async fn get_edges(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_collection(&state, &name).await?;
    let edges = state.store.edge_connections(&name, false).await?;
    let connections: Vec<Value> = edges
        .iter()
        .filter(|edge| edge.get("_from").is_some() && edge.get("_to").is_some())
        .map(|edge| {
            json!({
                "_from": edge.get("_from"),
                "_to": edge.get("_to"),
            })
        })
        .collect();
    Ok(Json(json!({
        "collection": name,
        "edge_count": connections.len(),
        "edges": connections,
    })))
}

#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    pub limit: Option<usize>,
}

/// GET /graphs/{name}/edges/detail
pub async fn get_edges_detail(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<DetailQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_collection(&state, &name).await?;
    let edges = state.store.edge_connections(&name, false).await?;

    let details: Vec<Value> = edges
        .iter()
        .filter(|edge| edge.get("_from").is_some() && edge.get("_to").is_some())
        .map(|edge| {
            without_nulls(json!({
                "_key": edge.get("_key"),
                "_from": edge.get("_from"),
                "_to": edge.get("_to"),
                "name": edge.get("name"),
                "prefix": edge.get("prefix"),
                "protocol": edge.get("protocol"),
                "sids": edge.get("sids").cloned().unwrap_or(json!([])),
                "country_codes": edge.get("country_codes"),
                "metrics": {
                    "unidir_delay": edge.get("unidir_link_delay"),
                    "percent_util_out": edge.get("percent_util_out"),
                    "percent_util_in": edge.get("percent_util_in"),
                    "bandwidth": edge.get("max_link_bandwidth"),
                    "reservable_bandwidth": edge.get("max_reservable_link_bandwidth"),
                    "load": edge.get("load"),
                },
                "timestamps": {
                    "first_seen": edge.get("first_seen_at"),
                    "last_seen": edge.get("last_seen_at"),
                    "updated": edge.get("updated_at"),
                },
            }))
        })
        .collect();

    let returned: Vec<&Value> = match query.limit {
        Some(limit) => details.iter().take(limit).collect(),
        None => details.iter().collect(),
    };

    Ok(Json(json!({
        "collection": name,
        "edge_count": details.len(),
        "returned_edges": returned.len(),
        "edges": returned,
    })))
}

// ─────────────────────────────────────────────────────────────────────────────
// Topology routes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TopologyQuery {
    pub include_all_fields: Option<bool>,
    #[serde(default)]
    pub algo: u32,
}

async fn topology_response(
    state: &AppState,
    name: &str,
    nodes_only: bool,
    include_all_fields: bool,
) -> Result<Value, ApiError> {
    let all_edges = state.store.edge_connections(name, nodes_only).await?;

    let mut edges = Vec::new();
    let mut ids = Vec::new();
    let mut seen = BTreeSet::new();
    for edge in &all_edges {
        let (Some(from), Some(to)) = (edge_endpoint(edge, "_from"), edge_endpoint(edge, "_to"))
        else {
            continue;
        };
        if include_all_fields {
            edges.push(edge.clone());
        } else {
            edges.push(json!({ "_from": from, "_to": to }));
        }
        for id in [from, to] {
            if seen.insert(id.to_string()) {
                ids.push(id.to_string());
            }
        }
    }

    let mut vertices = Map::new();
    for id in &ids {
        let Some(doc) = fetch_vertex(state, id).await else {
            continue;
        };
        if include_all_fields {
            vertices.insert(id.clone(), doc);
        } else {
            let sids: Option<Vec<Value>> = doc.get("sids").and_then(Value::as_array).map(|sids| {
                sids.iter()
                    .filter_map(|sid| sid.get("srv6_sid").cloned())
                    .collect()
            });
            vertices.insert(
                id.clone(),
                without_nulls(json!({
                    "collection": id.split('/').next(),
                    "name": doc.get("name"),
                    "prefix": doc.get("prefix"),
                    "protocol": doc.get("protocol"),
                    "sids": sids,
                    "asn": doc.get("asn"),
                })),
            );
        }
    }

    Ok(json!({
        "total_edges": edges.len(),
        "total_vertices": vertices.len(),
        "edges": edges,
        "vertices": vertices,
        "include_all_fields": include_all_fields,
    }))
}

/// GET /graphs/{name}/topology
pub async fn get_topology(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<TopologyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_collection(&state, &name).await?;
    let body = topology_response(&state, &name, false, query.include_all_fields.unwrap_or(true))
        .await?;
    Ok(Json(body))
}

/// GET /graphs/{name}/topology/nodes
pub async fn get_node_topology(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<TopologyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_collection(&state, &name).await?;
    let body = topology_response(&state, &name, true, query.include_all_fields.unwrap_or(true))
        .await?;
    Ok(Json(body))
}

/// GET /graphs/{name}/topology/nodes/algo
///
/// Node-to-node subgraph restricted to edges whose *both* endpoints
/// participate in the requested algorithm.
pub async fn get_node_topology_by_algo(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<TopologyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_collection(&state, &name).await?;
    let include_all_fields = query.include_all_fields.unwrap_or(true);

    let participating = state.store.vertices_by_algo(&name, query.algo, true).await?;
    let supported: BTreeSet<&str> = participating.iter().map(|v| v.id.as_str()).collect();
    let by_id: BTreeMap<&str, &jalapeno_kernel::store::AlgoVertex> =
        participating.iter().map(|v| (v.id.as_str(), v)).collect();

    let all_edges = state.store.edge_connections(&name, true).await?;
    let mut edges = Vec::new();
    let mut ids = Vec::new();
    let mut seen = BTreeSet::new();
    for edge in &all_edges {
        let (Some(from), Some(to)) = (edge_endpoint(edge, "_from"), edge_endpoint(edge, "_to"))
        else {
            continue;
        };
        if !supported.contains(from) || !supported.contains(to) {
            continue;
        }
        if include_all_fields {
            edges.push(edge.clone());
        } else {
            edges.push(json!({ "_from": from, "_to": to }));
        }
        for id in [from, to] {
            if seen.insert(id.to_string()) {
                ids.push(id.to_string());
            }
        }
    }

    let mut vertices = Map::new();
    for id in &ids {
        if include_all_fields {
            if let Some(doc) = fetch_vertex(&state, id).await {
                vertices.insert(id.clone(), doc);
            }
        } else if let Some(vertex) = by_id.get(id.as_str()) {
            vertices.insert(id.clone(), json!(vertex));
        }
    }

    Ok(Json(json!({
        "graph_collection": name,
        "algo": query.algo,
        "total_edges": edges.len(),
        "total_vertices": vertices.len(),
        "edges": edges,
        "vertices": vertices,
        "include_all_fields": include_all_fields,
    })))
}

/// Build the graphs router sub-tree.
pub fn router() -> axum::Router<AppState> {
    use axum::routing::get;
    axum::Router::new()
        .route("/graphs", get(get_graphs))
        .route("/graphs/{name}", get(get_graph))
        .route("/graphs/{name}/info", get(get_graph_info))
        .route("/graphs/{name}/vertices", get(get_vertices))
        .route("/graphs/{name}/vertices/keys", get(get_vertex_keys))
        .route("/graphs/{name}/vertices/ids", get(get_vertex_ids))
        .route("/graphs/{name}/vertices/algo", get(get_vertices_by_algo))
        .route("/graphs/{name}/vertices/summary", get(get_vertex_summary))
        .route("/graphs/{name}/edges", get(get_edges))
        .route("/graphs/{name}/edges/detail", get(get_edges_detail))
        .route("/graphs/{name}/topology", get(get_topology))
        .route("/graphs/{name}/topology/nodes", get(get_node_topology))
        .route(
            "/graphs/{name}/topology/nodes/algo",
            get(get_node_topology_by_algo),
        )
}
