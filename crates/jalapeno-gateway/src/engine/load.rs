//! The load updater.
//!
//! After a load-weighted path is computed, every edge on it gets its `load`
//! counter bumped by the request's increment. The read-increment-write is
//! deliberately racy: the graph store's per-document last-writer-wins is
//! the serialization point, and `load` is a back-pressure hint, not a
//! balance. Per-edge failures are logged and skipped - a partial update is
//! never surfaced as a request error, and nothing is rolled back.

use jalapeno_kernel::GraphStore;
use jalapeno_kernel::entity::PathEdge;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

/// Default per-call load increment.
pub const DEFAULT_LOAD_INCREMENT: u64 = 10;

#[derive(Debug, Serialize)]
pub struct EdgeLoad {
    pub edge_key: String,
    pub load: u64,
}

#[derive(Debug, Serialize)]
pub struct HighestLoad {
    pub edge_key: Option<String>,
    pub load_value: u64,
}

/// Load statistics attached to load-weighted path responses.
#[derive(Debug, Serialize)]
pub struct LoadData {
    pub updated_edges: Vec<String>,
    pub edge_loads: Vec<EdgeLoad>,
    pub average_load: f64,
    pub total_load: u64,
    pub edge_count: usize,
    pub highest_load: HighestLoad,
}

/// Increment `load` on every path edge and recompute the path statistics.
pub async fn apply_load(
    store: &dyn GraphStore,
    collection: &str,
    edges: &[PathEdge],
    increment: u64,
) -> LoadData {
    let mut updated_edges = Vec::new();
    let mut edge_loads: Vec<EdgeLoad> = Vec::new();

    for edge in edges {
        let current = match store.get_document(collection, &edge.key).await {
            Ok(Some(doc)) => doc.get("load").and_then(Value::as_u64).unwrap_or(0),
            Ok(None) => {
                warn!(edge = %edge.key, "edge vanished before load update, skipping");
                continue;
            }
            Err(err) => {
                warn!(edge = %edge.key, error = %err, "could not read edge for load update, skipping");
                continue;
            }
        };

        let new_load = current + increment;
        match store
            .update_document(collection, &edge.key, json!({ "load": new_load }))
            .await
        {
            Ok(()) => {
                debug!(edge = %edge.key, load = new_load, "load updated");
                updated_edges.push(edge.key.clone());
                edge_loads.push(EdgeLoad {
                    edge_key: edge.key.clone(),
                    load: new_load,
                });
            }
            Err(err) => {
                warn!(edge = %edge.key, error = %err, "load update failed, continuing");
            }
        }
    }

    let edge_count = edge_loads.len();
    let total_load: u64 = edge_loads.iter().map(|entry| entry.load).sum();
    let average_load = if edge_count > 0 {
        total_load as f64 / edge_count as f64
    } else {
        0.0
    };

    let mut highest_load = HighestLoad {
        edge_key: None,
        load_value: 0,
    };
    for entry in &edge_loads {
        if entry.load > highest_load.load_value {
            highest_load = HighestLoad {
                edge_key: Some(entry.edge_key.clone()),
                load_value: entry.load,
            };
        }
    }

    LoadData {
        updated_edges,
        edge_loads,
        average_load,
        total_load,
        edge_count,
        highest_load,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use jalapeno_graph::MemoryStore;

    fn seeded() -> (MemoryStore, Vec<PathEdge>) {
        let store = MemoryStore::new();
        store.insert("igp_node", "a", json!({}));
        store.insert("igp_node", "b", json!({}));
        store.insert("igp_node", "c", json!({}));
        store.insert_edge("ipv6_graph", "ab", "igp_node/a", "igp_node/b", json!({"load": 0}));
        store.insert_edge("ipv6_graph", "bc", "igp_node/b", "igp_node/c", json!({}));
        let edges = vec![
            PathEdge {
                key: "ab".into(),
                ..Default::default()
            },
            PathEdge {
                key: "bc".into(),
                ..Default::default()
            },
        ];
        (store, edges)
    }

    #[tokio::test]
    async fn increments_every_edge_and_reports_statistics() {
        let (store, edges) = seeded();
        let data = apply_load(&store, "ipv6_graph", &edges, 10).await;
        assert_eq!(data.updated_edges, vec!["ab", "bc"]);
        assert_eq!(data.edge_count, 2);
        assert_eq!(data.total_load, 20);
        assert_eq!(data.average_load, 10.0);
        assert_eq!(data.highest_load.load_value, 10);

        // monotonic across calls
        let data = apply_load(&store, "ipv6_graph", &edges, 10).await;
        assert_eq!(data.total_load, 40);
        assert_eq!(data.average_load, 20.0);
        assert_eq!(data.highest_load.load_value, 20);
        let doc = store
            .get_document("ipv6_graph", "ab")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["load"], 20);
    }

    #[tokio::test]
    async fn missing_edges_are_skipped_not_fatal() {
        let (store, mut edges) = seeded();
        edges.push(PathEdge {
            key: "ghost".into(),
            ..Default::default()
        });
        let data = apply_load(&store, "ipv6_graph", &edges, 5).await;
        assert_eq!(data.edge_count, 2);
        assert_eq!(data.updated_edges.len(), 2);
    }

    #[tokio::test]
    async fn average_follows_total_over_count() {
        let (store, edges) = seeded();
        store
            .update_document("ipv6_graph", "ab", json!({"load": 30}))
            .await
            .unwrap();
        let data = apply_load(&store, "ipv6_graph", &edges, 10).await;
        assert_eq!(data.total_load, 50);
        assert!((data.average_load - data.total_load as f64 / data.edge_count as f64).abs() < 1e-9);
        assert_eq!(data.highest_load.edge_key.as_deref(), Some("ab"));
        assert_eq!(data.highest_load.load_value, 40);
    }
}
