//! Path computation, traversal, and neighborhood endpoints.
//!
//! GET /graphs/{name}/shortest_path                 - hop-count shortest path + uSID
//! GET /graphs/{name}/shortest_path/latency         - latency-weighted + total_latency
//! GET /graphs/{name}/shortest_path/utilization     - utilization-weighted + average
//! GET /graphs/{name}/shortest_path/load            - load-weighted + load update
//! GET /graphs/{name}/shortest_path/sovereignty     - country-aware path
//! GET /graphs/{name}/shortest_path/best-paths      - up to `limit` ranked paths
//! GET /graphs/{name}/shortest_path/next-best-path  - shortest + hop-count alternates
//! GET /graphs/{name}/traverse                      - enumerated walks, full detail
//! GET /graphs/{name}/traverse/simple               - enumerated walks, compact
//! GET /graphs/{name}/neighbors                     - immediate neighborhood
//!
//! A search that finds nothing returns `200` with `found: false` - callers
//! branch on it and may relax their constraints.

use crate::engine::load::{self, DEFAULT_LOAD_INCREMENT};
use crate::engine::path::{self, NOT_FOUND_MESSAGE, PathArgs};
use crate::error::{ApiError, ApiResult};
use crate::handlers::{parse_direction, require_collection};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use jalapeno_kernel::entity::WeightAttribute;
use jalapeno_kernel::store::{NeighborSpec, TraversalSpec};
use serde::Deserialize;
use serde_json::{Value, json};

// ─────────────────────────────────────────────────────────────────────────────
// Query parameters
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PathQueryParams {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub direction: Option<String>,
    #[serde(default)]
    pub algo: u32,
    pub excluded_countries: Option<String>,
    pub limit: Option<u32>,
    pub same_hop_limit: Option<u32>,
    pub plus_one_limit: Option<u32>,
    pub load_increment: Option<u64>,
}

fn required(value: Option<String>, name: &str) -> ApiResult<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Validation(format!("missing required parameter: {name}")))
}

impl PathQueryParams {
    fn args(&self, graph: &str) -> ApiResult<PathArgs> {
        let mut args = PathArgs::new(
            graph,
            &required(self.source.clone(), "source")?,
            &required(self.destination.clone(), "destination")?,
        );
        args.direction = parse_direction(self.direction.as_deref())?;
        args.algo = self.algo;
        args.excluded_countries = self
            .excluded_countries
            .as_deref()
            .map(|csv| {
                csv.split(',')
                    .map(|code| code.trim().to_ascii_uppercase())
                    .filter(|code| !code.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Ok(args)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shortest-path family
// ─────────────────────────────────────────────────────────────────────────────

/// Run one weighted computation and append the aggregate under `field`.
async fn weighted_response(
    state: &AppState,
    mut args: PathArgs,
    weight: WeightAttribute,
) -> ApiResult<Value> {
    args.weight = Some(weight);
    match path::compute(state.store.as_ref(), &args).await? {
        Some(computed) => {
            let mut body = path::found_response(&args, &computed);
            body.insert(
                path::aggregate_field(weight).to_string(),
                json!(path::weight_aggregate(&computed.raw, weight)),
            );
            Ok(Value::Object(body))
        }
        None => Ok(path::not_found(NOT_FOUND_MESSAGE)),
    }
}

/// GET /graphs/{name}/shortest_path
pub async fn shortest_path(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<PathQueryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let args = params.args(&name)?;
    let body = match path::compute(state.store.as_ref(), &args).await? {
        Some(computed) => Value::Object(path::found_response(&args, &computed)),
        None => path::not_found(NOT_FOUND_MESSAGE),
    };
    Ok(Json(body))
}

/// GET /graphs/{name}/shortest_path/latency
pub async fn shortest_path_latency(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<PathQueryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let args = params.args(&name)?;
    Ok(Json(weighted_response(&state, args, WeightAttribute::Latency).await?))
}

/// GET /graphs/{name}/shortest_path/utilization
pub async fn shortest_path_utilization(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<PathQueryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let args = params.args(&name)?;
    Ok(Json(
        weighted_response(&state, args, WeightAttribute::PercentUtilOut).await?,
    ))
}

/// GET /graphs/{name}/shortest_path/load
///
/// Computes the load-weighted path, then increments `load` on every edge
/// of it. The increment is tunable per call and the update is
/// at-least-once: partial failures are logged, never surfaced.
pub async fn shortest_path_load(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<PathQueryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let mut args = params.args(&name)?;
    args.weight = Some(WeightAttribute::Load);
    let increment = params.load_increment.unwrap_or(DEFAULT_LOAD_INCREMENT);
    if increment == 0 {
        return Err(ApiError::Validation(
            "load_increment must be at least 1".to_string(),
        ));
    }

    let Some(computed) = path::compute(state.store.as_ref(), &args).await? else {
        return Ok(Json(path::not_found(NOT_FOUND_MESSAGE)));
    };

    let mut body = path::found_response(&args, &computed);
    body.insert(
        "average_load".to_string(),
        json!(path::weight_aggregate(&computed.raw, WeightAttribute::Load)),
    );

    let load_data =
        load::apply_load(state.store.as_ref(), &name, &computed.raw.edges, increment).await;
    body.insert("load_data".to_string(), json!(load_data));

    Ok(Json(Value::Object(body)))
}

/// GET /graphs/{name}/shortest_path/sovereignty
pub async fn shortest_path_sovereignty(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<PathQueryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let args = params.args(&name)?;
    if args.excluded_countries.is_empty() {
        return Err(ApiError::Validation(
            "missing required parameter: excluded_countries".to_string(),
        ));
    }

    let body = match path::compute(state.store.as_ref(), &args).await? {
        Some(computed) => {
            let mut body = path::found_response(&args, &computed);
            body.insert(
                "countries_traversed".to_string(),
                json!(path::countries_traversed(&computed.raw)),
            );
            body.insert(
                "excluded_countries".to_string(),
                json!(args.excluded_countries),
            );
            Value::Object(body)
        }
        None => path::not_found(&format!(
            "No path found between specified nodes avoiding countries: {}",
            args.excluded_countries.join(",")
        )),
    };
    Ok(Json(body))
}

/// GET /graphs/{name}/shortest_path/best-paths
pub async fn best_paths(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<PathQueryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let args = params.args(&name)?;
    let limit = params.limit.unwrap_or(4);
    Ok(Json(path::best_paths(state.store.as_ref(), &args, limit).await?))
}

/// GET /graphs/{name}/shortest_path/next-best-path
pub async fn next_best_path(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<PathQueryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let args = params.args(&name)?;
    let same_hop_limit = params.same_hop_limit.unwrap_or(4);
    let plus_one_limit = params.plus_one_limit.unwrap_or(8);
    Ok(Json(
        path::next_best_paths(state.store.as_ref(), &args, same_hop_limit, plus_one_limit)
            .await?,
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// Traversal and neighborhood
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TraverseParams {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub min_depth: Option<u32>,
    pub max_depth: Option<u32>,
    pub direction: Option<String>,
    pub depth: Option<u32>,
}

async fn run_traversal(
    state: &AppState,
    graph: &str,
    params: &TraverseParams,
    default_direction: &str,
) -> ApiResult<(TraversalSpec, Vec<jalapeno_kernel::store::WalkRecord>)> {
    require_collection(state, graph).await?;
    let spec = TraversalSpec {
        graph: graph.to_string(),
        source: required(params.source.clone(), "source")?,
        destination: params.destination.clone(),
        direction: parse_direction(Some(
            params.direction.as_deref().unwrap_or(default_direction),
        ))?,
        min_depth: params.min_depth.unwrap_or(1),
        max_depth: params.max_depth.unwrap_or(5),
    };
    let walks = state.store.traverse(&spec).await?;
    Ok((spec, walks))
}

/// GET /graphs/{name}/traverse
pub async fn traverse(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<TraverseParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (spec, walks) = run_traversal(&state, &name, &params, "any").await?;
    let total = walks.len();
    Ok(Json(json!({
        "source": spec.source,
        "destination": spec.destination,
        "min_depth": spec.min_depth,
        "max_depth": spec.max_depth,
        "direction": spec.direction.as_str(),
        "traversal_results": walks,
        "total_paths": total,
    })))
}

/// GET /graphs/{name}/traverse/simple
pub async fn traverse_simple(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<TraverseParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (spec, walks) = run_traversal(&state, &name, &params, "any").await?;
    let compact: Vec<Value> = walks
        .iter()
        .map(|walk| {
            json!({
                "path": walk.path,
                "sids": walk.sids,
                "country_codes": walk.country_codes,
                "metrics": walk.metrics,
            })
        })
        .collect();
    let total = compact.len();
    Ok(Json(json!({
        "source": spec.source,
        "destination": spec.destination,
        "min_depth": spec.min_depth,
        "max_depth": spec.max_depth,
        "direction": spec.direction.as_str(),
        "traversal_results": compact,
        "total_paths": total,
    })))
}

/// GET /graphs/{name}/neighbors
pub async fn neighbors(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<TraverseParams>,
) -> Result<impl IntoResponse, ApiError> {
    require_collection(&state, &name).await?;
    let spec = NeighborSpec {
        graph: name.clone(),
        source: required(params.source.clone(), "source")?,
        direction: parse_direction(params.direction.as_deref())?,
        depth: params.depth.unwrap_or(1),
    };
    let records = state.store.neighbors(&spec).await?;
    Ok(Json(json!({
        "source": spec.source,
        "direction": spec.direction.as_str(),
        "depth": spec.depth,
        "neighbor_count": records.len(),
        "neighbors": records,
    })))
}

/// Build the path-computation router sub-tree.
pub fn router() -> axum::Router<AppState> {
    use axum::routing::get;
    axum::Router::new()
        .route("/graphs/{name}/shortest_path", get(shortest_path))
        .route("/graphs/{name}/shortest_path/latency", get(shortest_path_latency))
        .route(
            "/graphs/{name}/shortest_path/utilization",
            get(shortest_path_utilization),
        )
        .route("/graphs/{name}/shortest_path/load", get(shortest_path_load))
        .route(
            "/graphs/{name}/shortest_path/sovereignty",
            get(shortest_path_sovereignty),
        )
        .route("/graphs/{name}/shortest_path/best-paths", get(best_paths))
        .route(
            "/graphs/{name}/shortest_path/next-best-path",
            get(next_best_path),
        )
        .route("/graphs/{name}/traverse", get(traverse))
        .route("/graphs/{name}/traverse/simple", get(traverse_simple))
        .route("/graphs/{name}/neighbors", get(neighbors))
}
