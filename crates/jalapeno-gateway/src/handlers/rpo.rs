//! Resource Path Optimization endpoints.
//!
//! GET /rpo                          - supported metrics and usable graphs
//! GET /rpo/{name}                   - endpoint inventory with metrics
//! GET /rpo/{name}/select-optimal    - scan the collection, select, route
//! GET /rpo/{name}/select-from-list  - scoped candidate list, select, route

use crate::engine::rpo::{self, RpoParams};
use crate::error::{ApiError, ApiResult};
use crate::handlers::{parse_direction, require_collection};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use jalapeno_kernel::metric::RpoMetric;
use jalapeno_kernel::store::ScanOptions;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::warn;

const DESCRIPTION: &str =
    "Resource Path Optimization (RPO) API for intelligent destination selection";
const GRAPHS_NOTE: &str =
    "Use graphs parameter to specify which topology graph to use for path finding";

/// Collections that look like routable topology graphs: common naming
/// patterns, minus vertex-collection names.
fn looks_like_graph(name: &str) -> bool {
    let lowered = name.to_ascii_lowercase();
    ["graph", "topology", "network"]
        .iter()
        .any(|pattern| lowered.contains(pattern))
        && !["domain", "node", "vertex"]
            .iter()
            .any(|pattern| lowered.contains(pattern))
}

fn metric_catalogue() -> Value {
    let mut metrics = Map::new();
    for metric in RpoMetric::ALL {
        metrics.insert(
            metric.as_str().to_string(),
            json!({
                "type": metric.kind(),
                "optimize": metric.strategy().as_str(),
            }),
        );
    }
    Value::Object(metrics)
}

fn parse_metric(raw: Option<&str>) -> ApiResult<RpoMetric> {
    let raw = raw
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Validation("missing required parameter: metric".to_string()))?;
    RpoMetric::from_str_ci(raw).ok_or_else(|| {
        let supported: Vec<&str> = RpoMetric::ALL.iter().map(|m| m.as_str()).collect();
        ApiError::Validation(format!(
            "Unsupported metric: {raw}. Supported metrics: {supported:?}"
        ))
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /rpo
///
/// Capability document. A store failure downgrades the graph listing to
/// empty rather than failing the whole request.
pub async fn get_rpo_info(State(state): State<AppState>) -> impl IntoResponse {
    let graphs = match state.store.list_collections().await {
        Ok(collections) => {
            let mut names: Vec<String> = collections
                .into_iter()
                .map(|meta| meta.name)
                .filter(|name| looks_like_graph(name))
                .collect();
            names.sort();
            names
        }
        Err(err) => {
            warn!(error = %err, "could not fetch graph collections");
            Vec::new()
        }
    };

    Json(json!({
        "supported_metrics": metric_catalogue(),
        "description": DESCRIPTION,
        "available_graph_collections": graphs,
        "note": GRAPHS_NOTE,
    }))
}

#[derive(Debug, Deserialize)]
pub struct InventoryQuery {
    pub limit: Option<u64>,
}

/// GET /rpo/{name}
pub async fn get_endpoints(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<InventoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_collection(&state, &name).await?;
    let endpoints = state
        .store
        .scan(
            &name,
            &ScanOptions {
                limit: query.limit,
                ..Default::default()
            },
        )
        .await?;
    Ok(Json(json!({
        "collection": name,
        "type": "collection",
        "count": endpoints.len(),
        "data": endpoints,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SelectQuery {
    pub source: Option<String>,
    pub metric: Option<String>,
    pub value: Option<String>,
    /// Topology collection to route over.
    pub graphs: Option<String>,
    pub direction: Option<String>,
    pub algo: Option<u32>,
    pub destinations: Option<String>,
}

impl SelectQuery {
    fn params(&self, collection: &str) -> ApiResult<RpoParams> {
        let source = self
            .source
            .clone()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::Validation("missing required parameter: source".to_string()))?;
        let graph = self
            .graphs
            .clone()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::Validation("missing required parameter: graphs".to_string()))?;
        Ok(RpoParams {
            endpoint_collection: collection.to_string(),
            source,
            metric: parse_metric(self.metric.as_deref())?,
            value: self.value.clone(),
            graph,
            direction: parse_direction(self.direction.as_deref())?,
            algo: self.algo,
        })
    }
}

/// GET /rpo/{name}/select-optimal
pub async fn select_optimal(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<SelectQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let params = query.params(&name)?;
    Ok(Json(rpo::select_optimal(state.store.as_ref(), &params).await?))
}

/// GET /rpo/{name}/select-from-list
pub async fn select_from_list(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<SelectQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let params = query.params(&name)?;
    let destinations = query
        .destinations
        .clone()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            ApiError::Validation("missing required parameter: destinations".to_string())
        })?;
    Ok(Json(
        rpo::select_from_list(state.store.as_ref(), &params, &destinations).await?,
    ))
}

/// Build the RPO router sub-tree.
pub fn router() -> axum::Router<AppState> {
    use axum::routing::get;
    axum::Router::new()
        .route("/rpo", get(get_rpo_info))
        .route("/rpo/{name}", get(get_endpoints))
        .route("/rpo/{name}/select-optimal", get(select_optimal))
        .route("/rpo/{name}/select-from-list", get(select_from_list))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_name_patterns() {
        assert!(looks_like_graph("ipv6_graph"));
        assert!(looks_like_graph("dc_topology"));
        assert!(!looks_like_graph("igp_node"));
        assert!(!looks_like_graph("igp_domain"));
        assert!(!looks_like_graph("hosts"));
    }

    #[test]
    fn metric_parsing_reports_the_supported_set() {
        assert!(parse_metric(Some("cpu_utilization")).is_ok());
        let err = parse_metric(Some("bandwidth")).unwrap_err();
        assert!(err.to_string().contains("Unsupported metric"));
        assert!(parse_metric(None).is_err());
    }
}
