//! End-to-end scenarios against the full router with an in-memory store.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use jalapeno_gateway::state::AppState;
use jalapeno_gateway::server::build_router;
use jalapeno_graph::MemoryStore;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

// ─────────────────────────────────────────────────────────────────────────────
// Harness
// ─────────────────────────────────────────────────────────────────────────────

fn app(store: MemoryStore) -> Router {
    let state = AppState::new(Arc::new(store), "http://memory", "jalapeno");
    build_router(state, Duration::from_secs(5))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn igp_node(store: &MemoryStore, key: &str, sids: Vec<Value>) {
    store.insert(
        "igp_node",
        key,
        json!({ "name": key, "router_id": format!("10.0.0.{key}"), "sids": sids }),
    );
}

fn sid(address: &str, algo: u32) -> Value {
    json!({
        "srv6_sid": address,
        "srv6_endpoint_behavior": { "algo": algo, "endpoint_behavior": 48, "flag": 0 }
    })
}

fn link(store: &MemoryStore, key: &str, from: &str, to: &str, extra: Value) {
    store.insert_edge(
        "ipv6_graph",
        key,
        &format!("igp_node/{from}"),
        &format!("igp_node/{to}"),
        extra,
    );
}

/// A → B → C → D, latency 10 per hop, algo-0 SIDs under fc00:0:.
fn line_graph() -> MemoryStore {
    let store = MemoryStore::new();
    for (i, key) in ["a", "b", "c", "d"].iter().enumerate() {
        igp_node(&store, key, vec![sid(&format!("fc00:0:{}::", i + 1), 0)]);
    }
    for (key, from, to) in [("ab", "a", "b"), ("bc", "b", "c"), ("cd", "c", "d")] {
        link(
            &store,
            key,
            from,
            to,
            json!({ "latency": 10, "percent_util_out": 20.0, "unidir_link_delay": 10, "load": 0 }),
        );
    }
    store
}

// ─────────────────────────────────────────────────────────────────────────────
// S1 - simple shortest path, algo 0
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn s1_simple_shortest_path() {
    let app = app(line_graph());
    let (status, body) = get(
        &app,
        "/api/v1/graphs/ipv6_graph/shortest_path?source=igp_node/a&destination=igp_node/d&direction=outbound",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["found"], json!(true));
    assert_eq!(body["hopcount"], json!(3));
    assert_eq!(body["vertex_count"], json!(4));
    assert_eq!(body["algo"], json!(0));
    assert_eq!(body["direction"], json!("outbound"));

    let keys: Vec<&str> = body["path"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["vertex"]["_key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["a", "b", "c", "d"]);

    // hopcount = |vertices| - 1, and edge count matches
    let edges: Vec<&Value> = body["path"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| &e["edge"])
        .collect();
    assert!(edges[..3].iter().all(|e| !e.is_null()));
    assert!(edges[3].is_null());

    let srv6 = &body["srv6_data"];
    assert_eq!(srv6["usid_block"], json!("fc00:0:"));
    assert_eq!(srv6["srv6_usid"], json!("fc00:0:1:2:3:4::"));
    assert!(srv6["srv6_usid"]
        .as_str()
        .unwrap()
        .parse::<std::net::Ipv6Addr>()
        .is_ok());
}

#[tokio::test]
async fn path_requests_are_idempotent() {
    let app = app(line_graph());
    let uri =
        "/api/v1/graphs/ipv6_graph/shortest_path?source=igp_node/a&destination=igp_node/d";
    let (_, first) = get(&app, uri).await;
    let (_, second) = get(&app, uri).await;
    assert_eq!(first["srv6_data"]["srv6_usid"], second["srv6_data"]["srv6_usid"]);
    assert_eq!(first["path"], second["path"]);
}

// ─────────────────────────────────────────────────────────────────────────────
// S2 - algo filter rejects a shorter path
// ─────────────────────────────────────────────────────────────────────────────

/// Two candidate paths A→D: a 2-hop one through a vertex without algo-128
/// SIDs and a 3-hop one where every vertex participates.
fn flex_algo_graph() -> MemoryStore {
    let store = MemoryStore::new();
    for (i, key) in ["a", "b", "c", "d"].iter().enumerate() {
        igp_node(
            &store,
            key,
            vec![
                sid(&format!("fc00:0:{}::", i + 1), 0),
                sid(&format!("fc00:2:{}::", i + 1), 128),
            ],
        );
    }
    // x carries only the base algo
    igp_node(&store, "x", vec![sid("fc00:0:9::", 0)]);
    link(&store, "ax", "a", "x", json!({}));
    link(&store, "xd", "x", "d", json!({}));
    link(&store, "ab", "a", "b", json!({}));
    link(&store, "bc", "b", "c", json!({}));
    link(&store, "cd", "c", "d", json!({}));
    store
}

#[tokio::test]
async fn s2_algo_filter_rejects_shorter_path() {
    let app = app(flex_algo_graph());

    // Unconstrained, the 2-hop path wins.
    let (_, base) = get(
        &app,
        "/api/v1/graphs/ipv6_graph/shortest_path?source=igp_node/a&destination=igp_node/d",
    )
    .await;
    assert_eq!(base["hopcount"], json!(2));

    // Constrained to algo 128, the 3-hop all-participating path wins.
    let (status, body) = get(
        &app,
        "/api/v1/graphs/ipv6_graph/shortest_path?source=igp_node/a&destination=igp_node/d&algo=128",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["found"], json!(true));
    assert_eq!(body["hopcount"], json!(3));
    assert_eq!(body["algo"], json!(128));

    let keys: Vec<&str> = body["path"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["vertex"]["_key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["a", "b", "c", "d"]);

    // SIDs in the carrier come from the algo-128 plane.
    assert_eq!(body["srv6_data"]["usid_block"], json!("fc00:2:"));
    assert_eq!(body["srv6_data"]["algo"], json!(128));
}

#[tokio::test]
async fn constrained_search_never_falls_back_to_algo_zero() {
    let app = app(line_graph());
    let (status, body) = get(
        &app,
        "/api/v1/graphs/ipv6_graph/shortest_path?source=igp_node/a&destination=igp_node/d&algo=99",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["found"], json!(false));
    assert!(body["message"].is_string());
}

// ─────────────────────────────────────────────────────────────────────────────
// S3 - sovereignty exclusion
// ─────────────────────────────────────────────────────────────────────────────

fn sovereignty_graph() -> MemoryStore {
    let store = MemoryStore::new();
    for key in ["a", "x", "y", "d"] {
        igp_node(&store, key, vec![sid(&format!("fc00:0:{key}::"), 0)]);
    }
    link(&store, "ax", "a", "x", json!({ "country_codes": ["US"] }));
    link(&store, "xd", "x", "d", json!({ "country_codes": ["US"] }));
    link(&store, "ay", "a", "y", json!({ "country_codes": ["DE"] }));
    link(&store, "yd", "y", "d", json!({ "country_codes": ["DE"] }));
    store
}

#[tokio::test]
async fn s3_sovereignty_exclusion() {
    let app = app(sovereignty_graph());
    let (status, body) = get(
        &app,
        "/api/v1/graphs/ipv6_graph/shortest_path/sovereignty?source=igp_node/a&destination=igp_node/d&excluded_countries=US",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["found"], json!(true));

    let keys: Vec<&str> = body["path"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["vertex"]["_key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["a", "y", "d"]);
    assert_eq!(body["countries_traversed"], json!(["DE"]));
    assert_eq!(body["excluded_countries"], json!(["US"]));
}

#[tokio::test]
async fn sovereignty_with_all_paths_excluded_is_not_found() {
    let app = app(sovereignty_graph());
    let (status, body) = get(
        &app,
        "/api/v1/graphs/ipv6_graph/shortest_path/sovereignty?source=igp_node/a&destination=igp_node/d&excluded_countries=US,DE",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["found"], json!(false));
}

#[tokio::test]
async fn sovereignty_requires_the_country_list() {
    let app = app(sovereignty_graph());
    let (status, body) = get(
        &app,
        "/api/v1/graphs/ipv6_graph/shortest_path/sovereignty?source=igp_node/a&destination=igp_node/d",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

// ─────────────────────────────────────────────────────────────────────────────
// S4 - load update is monotonic
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn s4_load_update_is_monotonic() {
    let app = app(line_graph());
    let uri = "/api/v1/graphs/ipv6_graph/shortest_path/load?source=igp_node/a&destination=igp_node/d";

    let (status, first) = get(&app, uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["found"], json!(true));
    let load_data = &first["load_data"];
    assert_eq!(load_data["edge_count"], json!(3));
    assert_eq!(load_data["total_load"], json!(30));
    assert_eq!(load_data["highest_load"]["load_value"], json!(10));
    for entry in load_data["edge_loads"].as_array().unwrap() {
        assert_eq!(entry["load"], json!(10));
    }

    let (_, second) = get(&app, uri).await;
    let load_data = &second["load_data"];
    assert_eq!(load_data["total_load"], json!(60));
    assert_eq!(load_data["average_load"], json!(20.0));
    assert_eq!(load_data["highest_load"]["load_value"], json!(20));
    for entry in load_data["edge_loads"].as_array().unwrap() {
        assert_eq!(entry["load"], json!(20));
    }

    // average_load = total_load / edge_count
    let total = load_data["total_load"].as_f64().unwrap();
    let count = load_data["edge_count"].as_f64().unwrap();
    let average = load_data["average_load"].as_f64().unwrap();
    assert!((average - total / count).abs() < 1e-9);
}

#[tokio::test]
async fn load_increment_is_tunable() {
    let app = app(line_graph());
    let (_, body) = get(
        &app,
        "/api/v1/graphs/ipv6_graph/shortest_path/load?source=igp_node/a&destination=igp_node/d&load_increment=25",
    )
    .await;
    assert_eq!(body["load_data"]["highest_load"]["load_value"], json!(25));

    let (status, _) = get(
        &app,
        "/api/v1/graphs/ipv6_graph/shortest_path/load?source=igp_node/a&destination=igp_node/d&load_increment=0",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─────────────────────────────────────────────────────────────────────────────
// S5 / S6 - RPO selection
// ─────────────────────────────────────────────────────────────────────────────

fn rpo_store() -> MemoryStore {
    let store = line_graph();
    store.insert(
        "hosts",
        "h1",
        json!({ "name": "h1", "cpu_utilization": 0.4, "language_model": "Llama" }),
    );
    store.insert(
        "hosts",
        "h2",
        json!({ "name": "h2", "cpu_utilization": 0.1, "language_model": "GPT" }),
    );
    store.insert(
        "hosts",
        "h3",
        json!({ "name": "h3", "cpu_utilization": 0.7, "language_model": "Llama" }),
    );
    for key in ["h1", "h2", "h3"] {
        store.insert_edge(
            "ipv6_graph",
            &format!("a{key}"),
            "igp_node/a",
            &format!("hosts/{key}"),
            json!({}),
        );
    }
    store
}

#[tokio::test]
async fn s5_rpo_numeric_minimize() {
    let app = app(rpo_store());
    let (status, body) = get(
        &app,
        "/api/v1/rpo/hosts/select-optimal?source=igp_node/a&metric=cpu_utilization&graphs=ipv6_graph",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selected_endpoint"]["_id"], json!("hosts/h2"));
    assert_eq!(body["metric_value"], json!(0.1));
    assert_eq!(body["optimization_strategy"], json!("minimize"));
    assert_eq!(body["total_endpoints_evaluated"], json!(3));
    assert_eq!(body["valid_endpoints_count"], json!(3));
    assert_eq!(body["path_result"]["found"], json!(true));
    assert!(!body["path_result"]["path"].as_array().unwrap().is_empty());
    assert_eq!(body["summary"]["destination"], json!("hosts/h2"));
    assert_eq!(body["summary"]["path_found"], json!(true));
}

#[tokio::test]
async fn s6_rpo_exact_match_from_list_keeps_candidate_order() {
    let app = app(rpo_store());
    let (status, body) = get(
        &app,
        "/api/v1/rpo/hosts/select-from-list?source=igp_node/a&destinations=hosts/h1,hosts/h2,hosts/h3&metric=language_model&value=Llama&graphs=ipv6_graph",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selected_endpoint"]["_id"], json!("hosts/h1"));
    assert_eq!(body["metric_value"], json!("Llama"));
    assert_eq!(body["optimization_strategy"], json!("exact_match"));
    assert_eq!(body["total_candidates"], json!(3));
    assert_eq!(body["valid_endpoints_count"], json!(2));
}

#[tokio::test]
async fn rpo_exact_match_requires_a_value() {
    let app = app(rpo_store());
    let (status, body) = get(
        &app,
        "/api/v1/rpo/hosts/select-optimal?source=igp_node/a&metric=language_model&graphs=ipv6_graph",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("language_model"));
}

#[tokio::test]
async fn rpo_unknown_metric_is_a_validation_error() {
    let app = app(rpo_store());
    let (status, body) = get(
        &app,
        "/api/v1/rpo/hosts/select-optimal?source=igp_node/a&metric=bandwidth&graphs=ipv6_graph",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("Unsupported metric"));
}

#[tokio::test]
async fn rpo_info_lists_the_metric_catalogue() {
    let app = app(rpo_store());
    let (status, body) = get(&app, "/api/v1/rpo").await;
    assert_eq!(status, StatusCode::OK);
    let metrics = body["supported_metrics"].as_object().unwrap();
    assert_eq!(metrics.len(), 9);
    assert_eq!(metrics["cpu_utilization"]["optimize"], json!("minimize"));
    assert_eq!(metrics["gpu_model"]["optimize"], json!("exact_match"));
    assert_eq!(
        body["available_graph_collections"],
        json!(["ipv6_graph"])
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Boundary behavior
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn source_equals_destination_is_a_zero_hop_path() {
    let app = app(line_graph());
    let (status, body) = get(
        &app,
        "/api/v1/graphs/ipv6_graph/shortest_path?source=igp_node/a&destination=igp_node/a",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["found"], json!(true));
    assert_eq!(body["hopcount"], json!(0));
    assert_eq!(body["vertex_count"], json!(1));
    assert!(body["path"][0]["edge"].is_null());
    // single µSID slot
    assert_eq!(body["srv6_data"]["srv6_usid"], json!("fc00:0:1::"));
}

#[tokio::test]
async fn vertex_without_sids_stays_on_path_but_not_in_carrier() {
    let store = MemoryStore::new();
    igp_node(&store, "a", vec![sid("fc00:0:1::", 0)]);
    store.insert("igp_node", "m", json!({ "name": "m" }));
    igp_node(&store, "d", vec![sid("fc00:0:3::", 0)]);
    link(&store, "am", "a", "m", json!({}));
    link(&store, "md", "m", "d", json!({}));

    let app = app(store);
    let (_, body) = get(
        &app,
        "/api/v1/graphs/ipv6_graph/shortest_path?source=igp_node/a&destination=igp_node/d",
    )
    .await;
    assert_eq!(body["vertex_count"], json!(3));
    assert_eq!(body["srv6_data"]["srv6_sid_list"], json!(["fc00:0:1::", "fc00:0:3::"]));
    assert_eq!(body["srv6_data"]["srv6_usid"], json!("fc00:0:1:3::"));
}

#[tokio::test]
async fn unknown_direction_is_a_validation_error() {
    let app = app(line_graph());
    let (status, body) = get(
        &app,
        "/api/v1/graphs/ipv6_graph/shortest_path?source=igp_node/a&destination=igp_node/d&direction=sideways",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        json!("Direction must be 'outbound', 'inbound', or 'any'")
    );
}

#[tokio::test]
async fn unknown_graph_is_not_found() {
    let app = app(line_graph());
    let (status, body) = get(
        &app,
        "/api/v1/graphs/missing_graph/shortest_path?source=igp_node/a&destination=igp_node/d",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].as_str().unwrap().contains("missing_graph"));
}

#[tokio::test]
async fn missing_source_is_a_validation_error() {
    let app = app(line_graph());
    let (status, body) = get(
        &app,
        "/api/v1/graphs/ipv6_graph/shortest_path?destination=igp_node/d",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("source"));
}

#[tokio::test]
async fn disconnected_path_is_found_false_not_an_error() {
    let store = line_graph();
    igp_node(&store, "z", vec![sid("fc00:0:9::", 0)]);
    let app = app(store);
    let (status, body) = get(
        &app,
        "/api/v1/graphs/ipv6_graph/shortest_path?source=igp_node/a&destination=igp_node/z",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["found"], json!(false));
}

// ─────────────────────────────────────────────────────────────────────────────
// Weighted variants
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn latency_endpoint_reports_the_sum() {
    let app = app(line_graph());
    let (_, body) = get(
        &app,
        "/api/v1/graphs/ipv6_graph/shortest_path/latency?source=igp_node/a&destination=igp_node/d",
    )
    .await;
    assert_eq!(body["total_latency"], json!(30.0));
}

#[tokio::test]
async fn utilization_endpoint_reports_the_average() {
    let app = app(line_graph());
    let (_, body) = get(
        &app,
        "/api/v1/graphs/ipv6_graph/shortest_path/utilization?source=igp_node/a&destination=igp_node/d",
    )
    .await;
    assert_eq!(body["average_utilization"], json!(20.0));
}

#[tokio::test]
async fn zero_hop_weighted_path_reports_null_aggregate() {
    let app = app(line_graph());
    let (_, body) = get(
        &app,
        "/api/v1/graphs/ipv6_graph/shortest_path/latency?source=igp_node/a&destination=igp_node/a",
    )
    .await;
    assert_eq!(body["found"], json!(true));
    assert!(body["total_latency"].is_null());
}

// ─────────────────────────────────────────────────────────────────────────────
// K-variants
// ─────────────────────────────────────────────────────────────────────────────

/// Line plus a parallel 2-hop branch: three distinct A→D paths.
fn multipath_graph() -> MemoryStore {
    let store = line_graph();
    igp_node(&store, "m", vec![sid("fc00:0:7::", 0)]);
    link(&store, "am", "a", "m", json!({ "latency": 50 }));
    link(&store, "md", "m", "d", json!({ "latency": 50 }));
    link(&store, "bd", "b", "d", json!({ "latency": 5 }));
    store
}

#[tokio::test]
async fn best_paths_are_ranked_and_unique() {
    let app = app(multipath_graph());
    let (status, body) = get(
        &app,
        "/api/v1/graphs/ipv6_graph/shortest_path/best-paths?source=igp_node/a&destination=igp_node/d&limit=3",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["found"], json!(true));

    let paths = body["paths"].as_array().unwrap();
    assert!(paths.len() <= 3);
    let hopcounts: Vec<u64> = paths.iter().map(|p| p["hopcount"].as_u64().unwrap()).collect();
    let mut sorted = hopcounts.clone();
    sorted.sort();
    assert_eq!(hopcounts, sorted);

    let sequences: Vec<Vec<&str>> = paths
        .iter()
        .map(|p| {
            p["path"]
                .as_array()
                .unwrap()
                .iter()
                .map(|e| e["vertex"]["_key"].as_str().unwrap())
                .collect()
        })
        .collect();
    let mut unique = sequences.clone();
    unique.dedup();
    assert_eq!(sequences.len(), unique.len());
}

#[tokio::test]
async fn best_paths_with_zero_limit_is_found_false() {
    let app = app(multipath_graph());
    let (status, body) = get(
        &app,
        "/api/v1/graphs/ipv6_graph/shortest_path/best-paths?source=igp_node/a&destination=igp_node/d&limit=0",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["found"], json!(false));
    assert_eq!(body["paths"], json!([]));
}

#[tokio::test]
async fn next_best_path_buckets_exclude_the_primary() {
    let app = app(multipath_graph());
    let (status, body) = get(
        &app,
        "/api/v1/graphs/ipv6_graph/shortest_path/next-best-path?source=igp_node/a&destination=igp_node/d",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["found"], json!(true));

    let base = body["summary"]["base_hopcount"].as_u64().unwrap();
    assert_eq!(base, 2);

    let primary: Vec<&str> = body["shortest_path"]["path"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["vertex"]["_key"].as_str().unwrap())
        .collect();

    for bucket in ["same_hopcount_paths", "plus_one_hopcount_paths"] {
        for entry in body[bucket].as_array().unwrap() {
            let sequence: Vec<&str> = entry["path"]
                .as_array()
                .unwrap()
                .iter()
                .map(|e| e["vertex"]["_key"].as_str().unwrap())
                .collect();
            assert_ne!(sequence, primary);
        }
    }
    // the parallel 2-hop branch lands in the same-hop bucket
    assert_eq!(body["summary"]["same_hopcount_alternatives"], json!(1));
    assert_eq!(
        body["same_hopcount_paths"][0]["hopcount"],
        json!(2)
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Traversal, neighbors, inventory
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn traverse_enumerates_walks_with_metrics() {
    let app = app(line_graph());
    let (status, body) = get(
        &app,
        "/api/v1/graphs/ipv6_graph/traverse?source=igp_node/a&destination=igp_node/d&direction=outbound",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_paths"], json!(1));
    let walk = &body["traversal_results"][0];
    assert_eq!(walk["path"], json!(["a", "b", "c", "d"]));
    assert_eq!(walk["metrics"]["hop_count"], json!(3));
    assert_eq!(walk["metrics"]["total_latency"], json!(30.0));
    assert!(walk["vertices"].is_array());
    assert!(walk["edges"].is_array());
}

#[tokio::test]
async fn traverse_simple_drops_the_detail() {
    let app = app(line_graph());
    let (_, body) = get(
        &app,
        "/api/v1/graphs/ipv6_graph/traverse/simple?source=igp_node/a&destination=igp_node/d&direction=outbound",
    )
    .await;
    let walk = &body["traversal_results"][0];
    assert!(walk.get("vertices").is_none());
    assert!(walk.get("edges").is_none());
    assert_eq!(walk["metrics"]["hop_count"], json!(3));
}

#[tokio::test]
async fn neighbors_reports_the_immediate_adjacency() {
    let app = app(line_graph());
    let (status, body) = get(
        &app,
        "/api/v1/graphs/ipv6_graph/neighbors?source=igp_node/b",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["neighbor_count"], json!(1));
    assert_eq!(body["neighbors"][0]["neighbor"]["_key"], json!("c"));
    assert_eq!(body["neighbors"][0]["metrics"]["hop_count"], json!(1));
}

#[tokio::test]
async fn health_reports_the_database_target() {
    let app = app(line_graph());
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["database_name"], json!("jalapeno"));
}

#[tokio::test]
async fn instances_lists_edge_collections() {
    let app = app(rpo_store());
    let (status, body) = get(&app, "/api/v1/instances").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["ipv6_graph"]));
}

#[tokio::test]
async fn vertices_by_algo_projects_matching_sids() {
    let app = app(flex_algo_graph());
    let (status, body) = get(
        &app,
        "/api/v1/graphs/ipv6_graph/vertices/algo?algo=128",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["algo"], json!(128));
    // x advertises no algo-128 SID
    assert_eq!(body["total_vertices"], json!(4));
    let igp = body["vertices_by_collection"]["igp_node"].as_array().unwrap();
    assert!(igp.iter().all(|v| {
        v["sids"]
            .as_array()
            .unwrap()
            .iter()
            .all(|s| s["algo"] == json!(128))
    }));
}

#[tokio::test]
async fn collection_inventory_round_trip() {
    let app = app(line_graph());

    let (status, body) = get(&app, "/api/v1/collections?filter_graphs=true").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], json!(1));
    assert_eq!(body["collections"][0]["name"], json!("ipv6_graph"));
    assert_eq!(body["collections"][0]["type"], json!("edge"));

    let (_, keys) = get(&app, "/api/v1/collections/igp_node/keys").await;
    assert_eq!(keys["key_count"], json!(4));

    let (_, info) = get(&app, "/api/v1/collections/igp_node/info").await;
    assert_eq!(info["count"], json!(4));
    assert_eq!(info["type"], json!("document"));

    let (status, _) = get(&app, "/api/v1/collections/nonexistent/info").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─────────────────────────────────────────────────────────────────────────────
// VPN projections
// ─────────────────────────────────────────────────────────────────────────────

fn vpn_store() -> MemoryStore {
    let store = MemoryStore::new();
    for (key, nexthop, rt, label) in [
        ("p1", "10.0.0.1", "100:1", 0x1000u64),
        ("p2", "10.0.0.1", "100:2", 0x2000),
        ("p3", "10.0.0.2", "100:1", 0x3000),
    ] {
        store.insert(
            "l3vpn_v4_prefix",
            key,
            json!({
                "prefix": "10.1.0.0",
                "prefix_len": 24,
                "vpn_rd": "100:100",
                "nexthop": nexthop,
                "labels": [label],
                "peer_asn": 65000,
                "base_attrs": { "ext_community_list": [format!("rt={rt}")] },
                "prefix_sid": { "srv6_l3_service": { "sub_tlvs": { "1": [{ "sid": "fc00:0:200::" }] } } }
            }),
        );
    }
    store
}

#[tokio::test]
async fn vpn_prefixes_by_pe_synthesize_service_sids() {
    let app = app(vpn_store());
    let (status, body) = get(
        &app,
        "/api/v1/vpns/l3vpn_v4_prefix/prefixes/by-pe?pe_router=10.0.0.1",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_prefixes"], json!(2));
    let row = &body["prefixes"][0];
    assert_eq!(row["function"], json!(["0001"]));
    assert_eq!(row["sid"], json!(["fc00:0:200:0001::"]));
}

#[tokio::test]
async fn vpn_summary_counts_cardinalities() {
    let app = app(vpn_store());
    let (status, body) = get(&app, "/api/v1/vpns/l3vpn_v4_prefix/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_prefixes"], json!(3));
    assert_eq!(body["unique_nexthop_count"], json!(2));
    assert_eq!(body["unique_route_target_count"], json!(2));
    assert_eq!(body["unique_label_count"], json!(3));
}

#[tokio::test]
async fn vpn_search_requires_a_filter() {
    let app = app(vpn_store());
    let (status, _) = get(&app, "/api/v1/vpns/l3vpn_v4_prefix/prefixes/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get(
        &app,
        "/api/v1/vpns/l3vpn_v4_prefix/prefixes/search?route_target=100:1",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_prefixes"], json!(2));
}

#[tokio::test]
async fn non_vpn_collections_are_rejected() {
    let store = vpn_store();
    store.insert("igp_node", "r1", json!({}));
    let app = app(store);
    let (status, body) = get(&app, "/api/v1/vpns/igp_node/summary").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("not a VPN collection"));
}
