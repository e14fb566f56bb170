//! The path-computation engine.
//!
//! Algorithm selection: an unconstrained request (algo 0, no excluded
//! countries) runs a single shortest-path search with the chosen weight; a
//! constrained one walks the K-shortest frontier and keeps the first path
//! on which every IGP vertex participates in the algorithm and no edge is
//! tagged with an excluded country. A constrained search that drains the
//! frontier is "not found" - there is no fallback to the base topology.
//!
//! Every found path is normalized to the canonical element sequence
//! (`{vertex, edge}` with a null edge on the terminal element) and carries
//! the folded uSID block.

use crate::error::{ApiError, ApiResult};
use jalapeno_kernel::entity::{Direction, WeightAttribute};
use jalapeno_kernel::srv6::{self, Srv6Data};
use jalapeno_kernel::store::{FixedDepthSpec, PathSpec, RawPath};
use jalapeno_kernel::GraphStore;
use serde_json::{Map, Value, json};

/// Message attached to `found: false` results.
pub const NOT_FOUND_MESSAGE: &str = "No path found between specified nodes";

/// Validated parameters of one path computation.
#[derive(Debug, Clone)]
pub struct PathArgs {
    pub graph: String,
    pub source: String,
    pub destination: String,
    pub direction: Direction,
    pub weight: Option<WeightAttribute>,
    pub algo: u32,
    pub excluded_countries: Vec<String>,
}

impl PathArgs {
    pub fn new(graph: &str, source: &str, destination: &str) -> Self {
        PathArgs {
            graph: graph.to_string(),
            source: source.to_string(),
            destination: destination.to_string(),
            direction: Direction::Outbound,
            weight: None,
            algo: 0,
            excluded_countries: Vec::new(),
        }
    }

    fn spec(&self) -> PathSpec {
        PathSpec {
            graph: self.graph.clone(),
            source: self.source.clone(),
            destination: self.destination.clone(),
            direction: self.direction,
            weight: self.weight,
            algo: self.algo,
            excluded_countries: self.excluded_countries.clone(),
        }
    }
}

/// A found path plus its derived SRv6 data.
#[derive(Debug)]
pub struct ComputedPath {
    pub raw: RawPath,
    pub srv6: Srv6Data,
}

/// Run the search for `args`. `Ok(None)` is the no-path outcome; the
/// collection check happens first so an unknown graph is a 404, not a
/// silent "not found".
pub async fn compute(store: &dyn GraphStore, args: &PathArgs) -> ApiResult<Option<ComputedPath>> {
    if !store.has_collection(&args.graph).await? {
        return Err(ApiError::not_found_collection(&args.graph));
    }
    let spec = args.spec();
    let raw = if spec.is_constrained() {
        store.k_shortest_paths(&spec, 1).await?.into_iter().next()
    } else {
        store.shortest_path(&spec).await?
    };
    Ok(raw.map(|raw| attach_srv6(raw, args.algo)))
}

fn attach_srv6(raw: RawPath, algo: u32) -> ComputedPath {
    let srv6 = srv6::synthesize_usid(&raw.vertices, algo, None);
    ComputedPath { raw, srv6 }
}

/// The canonical path element sequence: the edge at index `i` leads from
/// vertex `i` to vertex `i + 1`, so the terminal element's edge is null.
pub fn path_elements(raw: &RawPath) -> Vec<Value> {
    raw.vertices
        .iter()
        .enumerate()
        .map(|(i, vertex)| {
            json!({
                "vertex": vertex,
                "edge": raw.edges.get(i),
            })
        })
        .collect()
}

/// Ordered, deduplicated country tags across the path's edges.
pub fn countries_traversed(raw: &RawPath) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for edge in &raw.edges {
        for code in edge.country_codes.iter().flatten() {
            if !seen.iter().any(|existing| existing == code) {
                seen.push(code.clone());
            }
        }
    }
    seen
}

/// The weight-specific aggregate over a path: summed for latency, averaged
/// for utilization and load. `None` when no edge carries the attribute,
/// serialized as an explicit `null`.
pub fn weight_aggregate(raw: &RawPath, weight: WeightAttribute) -> Option<f64> {
    let values: Vec<f64> = raw
        .edges
        .iter()
        .filter_map(|edge| match weight {
            WeightAttribute::Latency => edge.latency,
            WeightAttribute::PercentUtilOut => edge.percent_util_out,
            WeightAttribute::Load => edge.load,
        })
        .collect();
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().sum();
    Some(match weight {
        WeightAttribute::Latency => sum,
        WeightAttribute::PercentUtilOut | WeightAttribute::Load => sum / values.len() as f64,
    })
}

/// Response key for a weight's aggregate.
pub fn aggregate_field(weight: WeightAttribute) -> &'static str {
    match weight {
        WeightAttribute::Latency => "total_latency",
        WeightAttribute::PercentUtilOut => "average_utilization",
        WeightAttribute::Load => "average_load",
    }
}

/// The `found: false` body.
pub fn not_found(message: &str) -> Value {
    json!({
        "found": false,
        "message": message,
    })
}

/// The shared skeleton of every found-path response. Weight-specific
/// aggregates and load data are appended by the callers that asked for
/// them.
pub fn found_response(args: &PathArgs, computed: &ComputedPath) -> Map<String, Value> {
    let raw = &computed.raw;
    let mut body = Map::new();
    body.insert("found".into(), json!(true));
    body.insert("path".into(), json!(path_elements(raw)));
    body.insert("hopcount".into(), json!(raw.hopcount()));
    body.insert("vertex_count".into(), json!(raw.vertices.len()));
    body.insert("source_info".into(), json!(raw.vertices.first()));
    body.insert("destination_info".into(), json!(raw.vertices.last()));
    body.insert("direction".into(), json!(args.direction.as_str()));
    body.insert("algo".into(), json!(args.algo));
    body.insert("srv6_data".into(), json!(computed.srv6));
    body
}

// ─────────────────────────────────────────────────────────────────────────────
// K-variants
// ─────────────────────────────────────────────────────────────────────────────

/// Up to `limit` ranked paths, each with its own SRv6 data.
pub async fn best_paths(store: &dyn GraphStore, args: &PathArgs, limit: u32) -> ApiResult<Value> {
    if !store.has_collection(&args.graph).await? {
        return Err(ApiError::not_found_collection(&args.graph));
    }
    let ranked = store.k_shortest_paths(&args.spec(), limit).await?;
    if ranked.is_empty() {
        return Ok(json!({
            "found": false,
            "message": "No paths found between specified nodes",
            "paths": [],
        }));
    }

    let paths: Vec<Value> = ranked
        .into_iter()
        .map(|raw| {
            let computed = attach_srv6(raw, args.algo);
            json!({
                "path": path_elements(&computed.raw),
                "hopcount": computed.raw.hopcount(),
                "vertex_count": computed.raw.vertices.len(),
                "source_info": computed.raw.vertices.first(),
                "destination_info": computed.raw.vertices.last(),
                "countries_traversed": countries_traversed(&computed.raw),
                "srv6_data": computed.srv6,
            })
        })
        .collect();

    Ok(json!({
        "found": true,
        "total_paths_found": paths.len(),
        "direction": args.direction.as_str(),
        "algo": args.algo,
        "paths": paths,
    }))
}

/// The single shortest path plus alternates at the same hop count and at
/// hop count + 1. Bucket entries are unique by vertex sequence and never
/// repeat the primary path.
pub async fn next_best_paths(
    store: &dyn GraphStore,
    args: &PathArgs,
    same_hop_limit: u32,
    plus_one_limit: u32,
) -> ApiResult<Value> {
    if !store.has_collection(&args.graph).await? {
        return Err(ApiError::not_found_collection(&args.graph));
    }

    let Some(shortest) = store.shortest_path(&args.spec()).await? else {
        return Ok(not_found(NOT_FOUND_MESSAGE));
    };
    let base_hopcount = shortest.hopcount() as u32;
    let primary_sequence: Vec<String> = shortest
        .vertex_sequence()
        .into_iter()
        .map(str::to_string)
        .collect();

    let bucket = |hopcount: u32, limit: u32| FixedDepthSpec {
        graph: args.graph.clone(),
        source: args.source.clone(),
        destination: args.destination.clone(),
        direction: args.direction,
        hopcount,
        // One extra row so dropping the primary path cannot shrink the
        // bucket below its limit.
        limit: limit.saturating_add(1),
    };

    let same_hop = store.fixed_depth_paths(&bucket(base_hopcount, same_hop_limit)).await?;
    let plus_one = store
        .fixed_depth_paths(&bucket(base_hopcount + 1, plus_one_limit))
        .await?;

    let dedupe = |candidates: Vec<RawPath>, limit: u32| -> Vec<RawPath> {
        let mut seen: Vec<Vec<String>> = vec![primary_sequence.clone()];
        let mut kept = Vec::new();
        for candidate in candidates {
            let sequence: Vec<String> = candidate
                .vertex_sequence()
                .into_iter()
                .map(str::to_string)
                .collect();
            if seen.contains(&sequence) {
                continue;
            }
            seen.push(sequence);
            kept.push(candidate);
            if kept.len() as u32 == limit {
                break;
            }
        }
        kept
    };

    let same_hop = dedupe(same_hop, same_hop_limit);
    let plus_one = dedupe(plus_one, plus_one_limit);

    let entry = |raw: &RawPath| {
        let computed = attach_srv6(raw.clone(), args.algo);
        json!({
            "path": path_elements(&computed.raw),
            "hopcount": computed.raw.hopcount(),
            "srv6_data": computed.srv6,
        })
    };

    let same_entries: Vec<Value> = same_hop.iter().map(entry).collect();
    let plus_entries: Vec<Value> = plus_one.iter().map(entry).collect();
    let same_count = same_entries.len();
    let plus_count = plus_entries.len();

    Ok(json!({
        "found": true,
        "algo": args.algo,
        "shortest_path": entry(&shortest),
        "same_hopcount_paths": same_entries,
        "plus_one_hopcount_paths": plus_entries,
        "summary": {
            "base_hopcount": base_hopcount,
            "same_hopcount_alternatives": same_count,
            "plus_one_hopcount_alternatives": plus_count,
        },
    }))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use jalapeno_kernel::entity::{PathEdge, PathVertex};

    fn raw(hops: usize) -> RawPath {
        let vertices = (0..=hops)
            .map(|i| PathVertex {
                id: format!("igp_node/r{i}"),
                key: format!("r{i}"),
                ..Default::default()
            })
            .collect();
        let edges = (0..hops)
            .map(|i| PathEdge {
                id: format!("ipv6_graph/e{i}"),
                key: format!("e{i}"),
                from: format!("igp_node/r{i}"),
                to: format!("igp_node/r{}", i + 1),
                latency: Some(10.0),
                percent_util_out: Some((i as f64 + 1.0) * 10.0),
                country_codes: Some(vec!["US".into(), "DE".into()]),
                ..Default::default()
            })
            .collect();
        RawPath { vertices, edges }
    }

    #[test]
    fn elements_put_null_edge_on_the_terminal_vertex() {
        let elements = path_elements(&raw(2));
        assert_eq!(elements.len(), 3);
        assert!(!elements[0]["edge"].is_null());
        assert!(!elements[1]["edge"].is_null());
        assert!(elements[2]["edge"].is_null());
        assert_eq!(elements[0]["edge"]["_key"], "e0");
    }

    #[test]
    fn latency_aggregates_as_a_sum() {
        assert_eq!(weight_aggregate(&raw(3), WeightAttribute::Latency), Some(30.0));
    }

    #[test]
    fn utilization_aggregates_as_an_average() {
        assert_eq!(
            weight_aggregate(&raw(2), WeightAttribute::PercentUtilOut),
            Some(15.0)
        );
    }

    #[test]
    fn aggregate_is_null_without_weighted_edges() {
        assert_eq!(weight_aggregate(&raw(0), WeightAttribute::Latency), None);
        assert_eq!(weight_aggregate(&raw(2), WeightAttribute::Load), None);
    }

    #[test]
    fn countries_deduplicate_in_order() {
        assert_eq!(countries_traversed(&raw(3)), vec!["US", "DE"]);
    }

    #[test]
    fn found_response_carries_the_canonical_fields() {
        let args = PathArgs::new("ipv6_graph", "igp_node/r0", "igp_node/r2");
        let computed = attach_srv6(raw(2), 0);
        let body = found_response(&args, &computed);
        assert_eq!(body["found"], json!(true));
        assert_eq!(body["hopcount"], json!(2));
        assert_eq!(body["vertex_count"], json!(3));
        assert_eq!(body["direction"], json!("outbound"));
        assert_eq!(body["source_info"]["_key"], json!("r0"));
        assert_eq!(body["destination_info"]["_key"], json!("r2"));
        assert!(body.contains_key("srv6_data"));
    }
}
