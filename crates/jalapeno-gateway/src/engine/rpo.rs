//! The Resource Path Optimization selector.
//!
//! Materializes a candidate endpoint set (whole collection or explicit
//! list), picks the winner by the declared metric, then routes from the
//! caller's source toward it. Path-computation failure is non-fatal: the
//! selection still returns, with `path_result.found = false`.

use crate::engine::path::{self, NOT_FOUND_MESSAGE, PathArgs};
use crate::error::{ApiError, ApiResult};
use jalapeno_kernel::GraphStore;
use jalapeno_kernel::entity::{Direction, DocumentId};
use jalapeno_kernel::metric::{self, RpoMetric, Selection, SelectionError};
use jalapeno_kernel::store::ScanOptions;
use serde_json::{Value, json};
use tracing::{info, warn};

/// Validated parameters of one RPO selection.
#[derive(Debug, Clone)]
pub struct RpoParams {
    pub endpoint_collection: String,
    pub source: String,
    pub metric: RpoMetric,
    pub value: Option<String>,
    /// Topology collection to route over.
    pub graph: String,
    pub direction: Direction,
    pub algo: Option<u32>,
}

fn selection_error(err: SelectionError) -> ApiError {
    match err {
        SelectionError::ValueRequired(metric) => {
            ApiError::Validation(format!("Value required for exact match metric: {metric}"))
        }
        other => ApiError::NotFound(other.to_string()),
    }
}

/// Scan the whole endpoint collection and select.
pub async fn select_optimal(store: &dyn GraphStore, params: &RpoParams) -> ApiResult<Value> {
    if !store.has_collection(&params.endpoint_collection).await? {
        return Err(ApiError::not_found_collection(&params.endpoint_collection));
    }
    let endpoints = store
        .scan(&params.endpoint_collection, &ScanOptions::default())
        .await?;
    if endpoints.is_empty() {
        return Err(ApiError::NotFound(format!(
            "No endpoints found in collection {}",
            params.endpoint_collection
        )));
    }
    let selection = metric::select_endpoint(&endpoints, params.metric, params.value.as_deref())
        .map_err(selection_error)?;
    let response = build_response(
        store,
        params,
        &selection,
        endpoints.len(),
        "total_endpoints_evaluated",
    )
    .await;
    Ok(response)
}

/// Resolve an explicit candidate list and select. Unresolvable entries are
/// logged and dropped; an empty resolved set is a 404.
pub async fn select_from_list(
    store: &dyn GraphStore,
    params: &RpoParams,
    destinations: &str,
) -> ApiResult<Value> {
    if !store.has_collection(&params.endpoint_collection).await? {
        return Err(ApiError::not_found_collection(&params.endpoint_collection));
    }

    let mut endpoints = Vec::new();
    for entry in destinations.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        // Bare keys resolve against the endpoint collection.
        let (collection, key) = match DocumentId::parse(entry) {
            Some(id) => (id.collection, id.key),
            None => (params.endpoint_collection.clone(), entry.to_string()),
        };
        match store.get_document(&collection, &key).await {
            Ok(Some(doc)) => endpoints.push(doc),
            Ok(None) => warn!(endpoint = entry, "could not find endpoint"),
            Err(err) => warn!(endpoint = entry, error = %err, "error resolving endpoint"),
        }
    }

    if endpoints.is_empty() {
        return Err(ApiError::NotFound(
            "No valid endpoints found in the provided list".to_string(),
        ));
    }

    let selection = metric::select_endpoint(&endpoints, params.metric, params.value.as_deref())
        .map_err(selection_error)?;
    let response =
        build_response(store, params, &selection, endpoints.len(), "total_candidates").await;
    Ok(response)
}

async fn build_response(
    store: &dyn GraphStore,
    params: &RpoParams,
    selection: &Selection<'_>,
    total: usize,
    total_field: &str,
) -> Value {
    let destination = selection
        .endpoint
        .get("_id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    info!(source = %params.source, %destination, "finding shortest path to selected endpoint");

    let mut args = PathArgs::new(&params.graph, &params.source, &destination);
    args.direction = params.direction;
    args.algo = params.algo.unwrap_or(0);

    let path_result = match path::compute(store, &args).await {
        Ok(Some(computed)) => Value::Object(path::found_response(&args, &computed)),
        Ok(None) => path::not_found(NOT_FOUND_MESSAGE),
        Err(err) => {
            warn!(error = %err, "could not find path to selected endpoint");
            json!({
                "found": false,
                "error": err.to_string(),
                "message": NOT_FOUND_MESSAGE,
            })
        }
    };

    let path_found = path_result.get("found").cloned().unwrap_or(json!(false));
    let hop_count = path_result.get("hopcount").cloned().unwrap_or(json!(0));

    json!({
        "collection": params.endpoint_collection,
        "source": params.source,
        "selected_endpoint": selection.endpoint,
        "optimization_metric": params.metric.as_str(),
        "metric_value": selection.metric_value,
        "optimization_strategy": params.metric.strategy().as_str(),
        "algo": params.algo.unwrap_or(0),
        total_field: total,
        "valid_endpoints_count": selection.valid_count,
        "path_result": path_result,
        "summary": {
            "destination": destination,
            "destination_name": selection
                .endpoint
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("Unknown"),
            "path_found": path_found,
            "hop_count": hop_count,
        },
    })
}
