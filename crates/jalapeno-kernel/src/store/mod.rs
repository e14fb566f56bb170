//! The graph store contract.
//!
//! [`GraphStore`] isolates the rest of the core from the query language of
//! the underlying graph database. Every operation is asynchronous and may
//! block on network I/O; these calls are the only suspension points in a
//! request. Implementations translate their own failures into the
//! [`StoreError`] taxonomy and must never leak backend-specific error
//! payloads upward.
//!
//! The trait mutates exactly one thing: the `load` counter on edge
//! documents, through [`GraphStore::update_document`]. Everything else is
//! read-only.

mod error;
mod types;

pub use error::StoreError;
pub use types::{
    AlgoSid, AlgoVertex, FixedDepthSpec, NeighborMetrics, NeighborRecord, NeighborSpec, PathSpec,
    PeRouterCount, RawPath, RouteTargetCount, ScanOptions, TraversalSpec, VertexBrief,
    VpnPrefixFilter, VpnPrefixRow, VpnSummary, WalkEdge, WalkMetrics, WalkRecord,
};

use crate::entity::CollectionMeta;
use async_trait::async_trait;
use serde_json::Value;

/// Abstract interface over a labeled-property graph database.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Whether a collection exists.
    async fn has_collection(&self, name: &str) -> Result<bool, StoreError>;

    /// All non-system collections with their kind, status, and count.
    async fn list_collections(&self) -> Result<Vec<CollectionMeta>, StoreError>;

    /// Metadata for one collection. `UnknownCollection` when absent.
    async fn collection_meta(&self, name: &str) -> Result<CollectionMeta, StoreError>;

    /// Scan a collection's documents.
    async fn scan(&self, collection: &str, opts: &ScanOptions) -> Result<Vec<Value>, StoreError>;

    /// Just the `_key` values of a collection.
    async fn scan_keys(&self, collection: &str) -> Result<Vec<String>, StoreError>;

    /// Fetch one document; `None` when the key is absent.
    async fn get_document(&self, collection: &str, key: &str)
    -> Result<Option<Value>, StoreError>;

    /// Patch one document. Used only for `load` increments; last writer
    /// wins at the store.
    async fn update_document(
        &self,
        collection: &str,
        key: &str,
        patch: Value,
    ) -> Result<(), StoreError>;

    /// Edge documents of a graph, optionally restricted to node-to-node
    /// links.
    async fn edge_connections(
        &self,
        graph: &str,
        nodes_only: bool,
    ) -> Result<Vec<Value>, StoreError>;

    /// Vertices referenced by a graph whose SID set participates in `algo`,
    /// with the matching SIDs projected.
    async fn vertices_by_algo(
        &self,
        graph: &str,
        algo: u32,
        nodes_only: bool,
    ) -> Result<Vec<AlgoVertex>, StoreError>;

    /// The single cheapest path for the spec, or `None` when the vertices
    /// are not connected. Algo and country constraints on the spec are
    /// ignored here - constrained searches go through
    /// [`k_shortest_paths`](Self::k_shortest_paths).
    async fn shortest_path(&self, spec: &PathSpec) -> Result<Option<RawPath>, StoreError>;

    /// Up to `k` loop-free paths in non-decreasing weight order (hop count
    /// breaks weight ties), after applying the spec's algo and country
    /// constraints.
    async fn k_shortest_paths(&self, spec: &PathSpec, k: u32)
    -> Result<Vec<RawPath>, StoreError>;

    /// Simple paths of exactly `spec.hopcount` hops ending at the
    /// destination.
    async fn fixed_depth_paths(&self, spec: &FixedDepthSpec) -> Result<Vec<RawPath>, StoreError>;

    /// Enumerated walks within the depth window.
    async fn traverse(&self, spec: &TraversalSpec) -> Result<Vec<WalkRecord>, StoreError>;

    /// Distinct neighborhood up to `spec.depth` hops.
    async fn neighbors(&self, spec: &NeighborSpec) -> Result<Vec<NeighborRecord>, StoreError>;

    /// Cardinality summary of an L3VPN prefix collection.
    async fn vpn_summary(&self, collection: &str) -> Result<VpnSummary, StoreError>;

    /// PE routers (nexthops) with prefix counts.
    async fn pe_routers(&self, collection: &str) -> Result<Vec<PeRouterCount>, StoreError>;

    /// Route targets with prefix counts.
    async fn route_targets(&self, collection: &str) -> Result<Vec<RouteTargetCount>, StoreError>;

    /// Prefix rows matching `filter`, limited to `limit`, plus the
    /// unlimited match count.
    async fn vpn_prefixes(
        &self,
        collection: &str,
        filter: &VpnPrefixFilter,
        limit: u64,
    ) -> Result<(u64, Vec<VpnPrefixRow>), StoreError>;
}
