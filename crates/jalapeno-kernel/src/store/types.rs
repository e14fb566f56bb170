//! Query specifications and result records for [`GraphStore`](super::GraphStore).
//!
//! These types are the whole contract between the engine and a backend: the
//! engine describes *what* to search, the backend decides *how* (AQL on the
//! wire, in-process search in tests). User input never reaches a query
//! string directly.

use crate::entity::{Direction, PathEdge, PathVertex, WeightAttribute};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Query specifications
// ─────────────────────────────────────────────────────────────────────────────

/// A shortest-path / K-shortest-paths request.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSpec {
    /// Edge collection to route over.
    pub graph: String,
    /// Source vertex id (`collection/key`).
    pub source: String,
    /// Destination vertex id.
    pub destination: String,
    pub direction: Direction,
    /// Edge weight attribute; hop count when absent. Unknown attributes on
    /// an edge fall back to a default weight of 1.
    pub weight: Option<WeightAttribute>,
    /// Flex-Algo constraint. Zero means unconstrained.
    pub algo: u32,
    /// ISO country codes no path edge may carry.
    pub excluded_countries: Vec<String>,
}

impl PathSpec {
    pub fn new(graph: &str, source: &str, destination: &str) -> Self {
        PathSpec {
            graph: graph.to_string(),
            source: source.to_string(),
            destination: destination.to_string(),
            direction: Direction::Outbound,
            weight: None,
            algo: 0,
            excluded_countries: Vec::new(),
        }
    }

    /// Whether the K-shortest frontier must be filtered at all.
    pub fn is_constrained(&self) -> bool {
        self.algo != 0 || !self.excluded_countries.is_empty()
    }
}

/// Enumerate simple paths of an exact hop count between two vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedDepthSpec {
    pub graph: String,
    pub source: String,
    pub destination: String,
    pub direction: Direction,
    pub hopcount: u32,
    pub limit: u32,
}

/// Bounded-depth walk enumeration from a source vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct TraversalSpec {
    pub graph: String,
    pub source: String,
    /// When set, only walks ending at this vertex are returned.
    pub destination: Option<String>,
    pub direction: Direction,
    pub min_depth: u32,
    pub max_depth: u32,
}

/// Immediate-neighborhood lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborSpec {
    pub graph: String,
    pub source: String,
    pub direction: Direction,
    pub depth: u32,
}

/// Options for a plain collection scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanOptions {
    pub limit: Option<u64>,
    pub skip: Option<u64>,
    /// Restrict to the document with this `_key`.
    pub filter_key: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Result records
// ─────────────────────────────────────────────────────────────────────────────

/// An ordered path as the backend yields it: `edges[i]` connects
/// `vertices[i]` to `vertices[i + 1]`, so `edges.len() == vertices.len() - 1`
/// for every non-empty path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPath {
    pub vertices: Vec<PathVertex>,
    pub edges: Vec<PathEdge>,
}

impl RawPath {
    pub fn hopcount(&self) -> usize {
        self.vertices.len().saturating_sub(1)
    }

    /// Vertex keys in path order - the identity used for loop-freedom and
    /// bucket deduplication.
    pub fn vertex_sequence(&self) -> Vec<&str> {
        self.vertices.iter().map(|v| v.id.as_str()).collect()
    }
}

/// A vertex referenced by a graph together with the SIDs matching a
/// requested algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgoVertex {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_key")]
    pub key: String,
    pub collection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router_id: Option<String>,
    pub sids: Vec<AlgoSid>,
}

/// Projection of one matching SID on an [`AlgoVertex`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgoSid {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srv6_sid: Option<String>,
    pub algo: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_behavior: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<u32>,
}

/// Edge projection used by traversal and neighbor records. Latency here is
/// the IGP-advertised `unidir_link_delay`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalkEdge {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_util: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_codes: Option<Vec<String>>,
}

/// Aggregates over one enumerated walk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalkMetrics {
    pub total_latency: Option<f64>,
    pub avg_util: Option<f64>,
    pub load: Option<f64>,
    pub hop_count: u32,
}

/// One enumerated walk with its per-hop detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkRecord {
    /// Vertex keys in walk order.
    pub path: Vec<String>,
    /// First advertised SRv6 SID per vertex (null where none).
    pub sids: Vec<Option<String>>,
    /// Per-edge country tags.
    pub country_codes: Vec<Option<Vec<String>>>,
    pub metrics: WalkMetrics,
    pub vertices: Vec<VertexBrief>,
    pub edges: Vec<WalkEdge>,
}

/// Compact vertex view used by neighbor records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VertexBrief {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// First advertised SRv6 SID, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sids: Option<String>,
}

/// One reachable neighbor and the edge it was reached over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborRecord {
    pub neighbor: VertexBrief,
    pub edge: WalkEdge,
    pub metrics: NeighborMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborMetrics {
    pub hop_count: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// VPN records
// ─────────────────────────────────────────────────────────────────────────────

/// Cardinality summary over an L3VPN prefix collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VpnSummary {
    pub total_prefixes: u64,
    pub unique_rd_count: u64,
    pub unique_route_target_count: u64,
    pub unique_nexthop_count: u64,
    pub unique_peer_asn_count: u64,
    pub unique_label_count: u64,
}

/// A PE router (nexthop) and how many prefixes it advertises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeRouterCount {
    pub pe_router: String,
    pub prefix_count: u64,
}

/// A route target and how many prefixes carry it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteTargetCount {
    pub route_target: String,
    pub prefix_count: u64,
}

/// Filter shapes for VPN prefix lookups.
#[derive(Debug, Clone, PartialEq)]
pub enum VpnPrefixFilter {
    ByPe {
        pe_router: String,
    },
    ByRouteTarget {
        route_target: String,
    },
    ByPeAndRouteTarget {
        pe_router: String,
        route_target: String,
    },
    Search {
        prefix: Option<String>,
        prefix_exact: bool,
        route_target: Option<String>,
        vpn_rd: Option<String>,
    },
}

/// One L3VPN prefix row as projected for the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VpnPrefixRow {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_len: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpn_rd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nexthop: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_asn: Option<u32>,
    #[serde(default)]
    pub route_targets: Vec<String>,
    /// The advertised L3 service locator SID, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srv6_sid: Option<String>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_spec_constraint_detection() {
        let mut spec = PathSpec::new("ipv6_graph", "igp_node/a", "igp_node/d");
        assert!(!spec.is_constrained());
        spec.algo = 128;
        assert!(spec.is_constrained());
        spec.algo = 0;
        spec.excluded_countries = vec!["US".into()];
        assert!(spec.is_constrained());
    }

    #[test]
    fn raw_path_hopcount_matches_edge_count() {
        let path = RawPath {
            vertices: vec![
                PathVertex {
                    id: "igp_node/a".into(),
                    key: "a".into(),
                    ..Default::default()
                },
                PathVertex {
                    id: "igp_node/b".into(),
                    key: "b".into(),
                    ..Default::default()
                },
            ],
            edges: vec![PathEdge::default()],
        };
        assert_eq!(path.hopcount(), 1);
        assert_eq!(path.hopcount(), path.edges.len());
        assert_eq!(path.vertex_sequence(), vec!["igp_node/a", "igp_node/b"]);
    }

    #[test]
    fn empty_path_has_zero_hopcount() {
        let path = RawPath {
            vertices: Vec::new(),
            edges: Vec::new(),
        };
        assert_eq!(path.hopcount(), 0);
    }
}
