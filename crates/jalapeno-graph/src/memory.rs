//! In-memory [`GraphStore`] implementation.
//!
//! [`MemoryStore`] keeps collections as ordered maps and implements the
//! full store contract with in-process search: Dijkstra for the single
//! cheapest path, bounded simple-path enumeration (sorted by total weight,
//! then hop count) for the K-shortest variants, windowed DFS for
//! traversals, and Rust-side aggregation for the VPN projections.
//!
//! It backs the test suites and local experimentation; semantics mirror
//! the ArangoDB adapter, including direction handling, the Flex-Algo
//! participation constraint, and country exclusion.

use async_trait::async_trait;
use jalapeno_kernel::algo;
use jalapeno_kernel::entity::{CollectionKind, CollectionMeta, Direction, PathEdge, PathVertex,
    WeightAttribute};
use jalapeno_kernel::store::{
    AlgoSid, AlgoVertex, FixedDepthSpec, GraphStore, NeighborMetrics, NeighborRecord,
    NeighborSpec, PathSpec, PeRouterCount, RawPath, RouteTargetCount, ScanOptions, StoreError,
    TraversalSpec, VertexBrief, VpnPrefixFilter, VpnPrefixRow, VpnSummary, WalkEdge, WalkMetrics,
    WalkRecord,
};
use serde_json::{Value, json};
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap, VecDeque};
use std::sync::RwLock;
use tracing::debug;

/// Simple-path enumeration stops after this many paths. Depth needs no
/// cap of its own: a simple path never has more edges than the graph has
/// vertices with outgoing edges.
const MAX_ENUMERATED_PATHS: usize = 512;

#[derive(Debug)]
struct MemCollection {
    kind: CollectionKind,
    docs: BTreeMap<String, Value>,
}

/// In-process graph store.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<BTreeMap<String, MemCollection>>,
}

/// One enumerated path over the in-memory graph.
struct MemPath {
    vertex_ids: Vec<String>,
    edges: Vec<Value>,
}

/// Min-heap entry for the cheapest-path search. Hop count breaks cost
/// ties; the vertex id keeps equal entries deterministic.
#[derive(Debug, PartialEq)]
struct SearchEntry {
    cost: f64,
    hops: usize,
    vertex: String,
}

impl Eq for SearchEntry {}

impl Ord for SearchEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .partial_cmp(&other.cost)
            .unwrap_or(Ordering::Equal)
            .then(self.hops.cmp(&other.hops))
            .then_with(|| self.vertex.cmp(&other.vertex))
    }
}

impl PartialOrd for SearchEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty collection. Replaces any existing one of the same
    /// name.
    pub fn create_collection(&self, name: &str, kind: CollectionKind) {
        self.collections.write().unwrap().insert(
            name.to_string(),
            MemCollection {
                kind,
                docs: BTreeMap::new(),
            },
        );
    }

    /// Insert a document, stamping `_id` and `_key`. The collection is
    /// created as a document collection when absent.
    pub fn insert(&self, collection: &str, key: &str, mut doc: Value) {
        if let Some(obj) = doc.as_object_mut() {
            obj.insert("_id".to_string(), json!(format!("{collection}/{key}")));
            obj.insert("_key".to_string(), json!(key));
        }
        let mut collections = self.collections.write().unwrap();
        collections
            .entry(collection.to_string())
            .or_insert_with(|| MemCollection {
                kind: CollectionKind::Document,
                docs: BTreeMap::new(),
            })
            .docs
            .insert(key.to_string(), doc);
    }

    /// Insert an edge document, stamping identity and endpoints. The
    /// collection is created as an edge collection when absent.
    pub fn insert_edge(&self, collection: &str, key: &str, from: &str, to: &str, mut doc: Value) {
        if let Some(obj) = doc.as_object_mut() {
            obj.insert("_from".to_string(), json!(from));
            obj.insert("_to".to_string(), json!(to));
        }
        {
            let mut collections = self.collections.write().unwrap();
            collections
                .entry(collection.to_string())
                .or_insert_with(|| MemCollection {
                    kind: CollectionKind::Edge,
                    docs: BTreeMap::new(),
                });
        }
        self.insert(collection, key, doc);
    }

    /// Resolve a `collection/key` id to its document.
    fn document(&self, id: &str) -> Option<Value> {
        let (collection, key) = id.split_once('/')?;
        self.collections
            .read()
            .unwrap()
            .get(collection)?
            .docs
            .get(key)
            .cloned()
    }

    fn edge_docs(&self, graph: &str) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read().unwrap();
        let collection = collections
            .get(graph)
            .ok_or_else(|| StoreError::UnknownCollection(graph.to_string()))?;
        Ok(collection.docs.values().cloned().collect())
    }

    /// Adjacency under the requested direction. `Any` walks edges both
    /// ways.
    fn adjacency(
        &self,
        graph: &str,
        direction: Direction,
    ) -> Result<HashMap<String, Vec<(String, Value)>>, StoreError> {
        let mut adjacency: HashMap<String, Vec<(String, Value)>> = HashMap::new();
        for edge in self.edge_docs(graph)? {
            let (Some(from), Some(to)) = (
                edge.get("_from").and_then(Value::as_str),
                edge.get("_to").and_then(Value::as_str),
            ) else {
                continue;
            };
            match direction {
                Direction::Outbound => {
                    adjacency
                        .entry(from.to_string())
                        .or_default()
                        .push((to.to_string(), edge.clone()));
                }
                Direction::Inbound => {
                    adjacency
                        .entry(to.to_string())
                        .or_default()
                        .push((from.to_string(), edge.clone()));
                }
                Direction::Any => {
                    adjacency
                        .entry(from.to_string())
                        .or_default()
                        .push((to.to_string(), edge.clone()));
                    adjacency
                        .entry(to.to_string())
                        .or_default()
                        .push((from.to_string(), edge.clone()));
                }
            }
        }
        Ok(adjacency)
    }

    fn edge_weight(edge: &Value, weight: Option<WeightAttribute>) -> f64 {
        weight
            .and_then(|attr| edge.get(attr.key()))
            .and_then(Value::as_f64)
            .unwrap_or(1.0)
    }

    /// Dijkstra over the adjacency; hop count breaks cost ties.
    fn cheapest_path(
        &self,
        spec: &PathSpec,
        adjacency: &HashMap<String, Vec<(String, Value)>>,
    ) -> Option<MemPath> {
        if spec.source == spec.destination {
            self.document(&spec.source)?;
            return Some(MemPath {
                vertex_ids: vec![spec.source.clone()],
                edges: Vec::new(),
            });
        }

        let mut best: HashMap<String, (f64, usize)> = HashMap::new();
        let mut prev: HashMap<String, (String, Value)> = HashMap::new();
        // Min-heap: Reverse makes the max-heap BinaryHeap pop the cheapest
        // entry first.
        let mut heap: BinaryHeap<Reverse<SearchEntry>> = BinaryHeap::new();
        best.insert(spec.source.clone(), (0.0, 0));
        heap.push(Reverse(SearchEntry {
            cost: 0.0,
            hops: 0,
            vertex: spec.source.clone(),
        }));

        while let Some(Reverse(entry)) = heap.pop() {
            if entry.vertex == spec.destination {
                let mut vertex_ids = vec![entry.vertex.clone()];
                let mut edges = Vec::new();
                let mut cursor = entry.vertex;
                while let Some((previous, edge)) = prev.get(&cursor) {
                    vertex_ids.push(previous.clone());
                    edges.push(edge.clone());
                    cursor = previous.clone();
                }
                vertex_ids.reverse();
                edges.reverse();
                return Some(MemPath { vertex_ids, edges });
            }

            // Skip stale heap entries.
            if let Some(&(cost, hops)) = best.get(&entry.vertex) {
                if (entry.cost, entry.hops) > (cost, hops) {
                    continue;
                }
            }

            for (next, edge) in adjacency.get(&entry.vertex).into_iter().flatten() {
                let cost = entry.cost + Self::edge_weight(edge, spec.weight);
                let hops = entry.hops + 1;
                let improved = match best.get(next) {
                    Some(&(best_cost, best_hops)) => {
                        (cost, hops) < (best_cost, best_hops)
                    }
                    None => true,
                };
                if improved {
                    best.insert(next.clone(), (cost, hops));
                    prev.insert(next.clone(), (entry.vertex.clone(), edge.clone()));
                    heap.push(Reverse(SearchEntry {
                        cost,
                        hops,
                        vertex: next.clone(),
                    }));
                }
            }
        }
        None
    }

    /// Enumerate simple paths from `start`, depth-first, bounded by
    /// [`MAX_ENUMERATED_PATHS`]. The caller's depth window is honored
    /// as-is, matching the ArangoDB adapter.
    #[allow(clippy::too_many_arguments)]
    fn enumerate(
        adjacency: &HashMap<String, Vec<(String, Value)>>,
        current: &str,
        min_depth: usize,
        max_depth: usize,
        destination: Option<&str>,
        vertex_ids: &mut Vec<String>,
        edges: &mut Vec<Value>,
        results: &mut Vec<MemPath>,
    ) {
        if results.len() >= MAX_ENUMERATED_PATHS {
            return;
        }
        let depth = edges.len();
        match destination {
            Some(destination) if current == destination => {
                if depth >= min_depth && depth > 0 {
                    results.push(MemPath {
                        vertex_ids: vertex_ids.clone(),
                        edges: edges.clone(),
                    });
                }
                // A simple path cannot revisit the destination.
                return;
            }
            None if depth >= min_depth && depth > 0 => {
                results.push(MemPath {
                    vertex_ids: vertex_ids.clone(),
                    edges: edges.clone(),
                });
            }
            _ => {}
        }
        if depth >= max_depth {
            return;
        }
        for (next, edge) in adjacency.get(current).into_iter().flatten() {
            if vertex_ids.iter().any(|seen| seen == next) {
                continue;
            }
            vertex_ids.push(next.clone());
            edges.push(edge.clone());
            Self::enumerate(
                adjacency,
                next,
                min_depth,
                max_depth,
                destination,
                vertex_ids,
                edges,
                results,
            );
            vertex_ids.pop();
            edges.pop();
        }
    }

    fn simple_paths(
        &self,
        adjacency: &HashMap<String, Vec<(String, Value)>>,
        source: &str,
        min_depth: usize,
        max_depth: usize,
        destination: Option<&str>,
    ) -> Vec<MemPath> {
        let mut results = Vec::new();
        let mut vertex_ids = vec![source.to_string()];
        let mut edges = Vec::new();
        Self::enumerate(
            adjacency,
            source,
            min_depth,
            max_depth,
            destination,
            &mut vertex_ids,
            &mut edges,
            &mut results,
        );
        if results.len() >= MAX_ENUMERATED_PATHS {
            debug!(source, "path enumeration hit the in-memory cap");
        }
        results
    }

    /// The spec's algo-participation and country-exclusion constraints.
    fn satisfies_constraints(&self, path: &MemPath, algo: u32, excluded: &[String]) -> bool {
        if algo != 0 {
            for vertex_id in &path.vertex_ids {
                if !algo::is_igp_vertex(vertex_id) {
                    continue;
                }
                let participates = self
                    .document(vertex_id)
                    .map(|doc| algo::document_participates(&doc, algo))
                    .unwrap_or(false);
                if !participates {
                    return false;
                }
            }
        }
        if !excluded.is_empty() {
            for edge in &path.edges {
                let tagged = edge
                    .get("country_codes")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                    .filter_map(Value::as_str)
                    .any(|code| excluded.iter().any(|ex| ex == code));
                if tagged {
                    return false;
                }
            }
        }
        true
    }

    fn to_raw_path(&self, path: &MemPath) -> Result<RawPath, StoreError> {
        let mut vertices = Vec::with_capacity(path.vertex_ids.len());
        for vertex_id in &path.vertex_ids {
            let doc = self.document(vertex_id).ok_or_else(|| {
                StoreError::Rejected(format!("dangling vertex reference {vertex_id}"))
            })?;
            let vertex = PathVertex::from_document(&doc).ok_or_else(|| {
                StoreError::Rejected(format!("vertex {vertex_id} lacks identity"))
            })?;
            vertices.push(vertex);
        }
        let edges = path
            .edges
            .iter()
            .filter_map(PathEdge::from_document)
            .collect();
        Ok(RawPath { vertices, edges })
    }

    fn first_sid(doc: &Value) -> Option<String> {
        doc.get("sids")?
            .as_array()?
            .first()?
            .get("srv6_sid")?
            .as_str()
            .map(str::to_string)
    }

    fn vertex_brief(doc: &Value) -> VertexBrief {
        VertexBrief {
            id: doc.get("_id").and_then(Value::as_str).unwrap_or_default().to_string(),
            key: doc.get("_key").and_then(Value::as_str).unwrap_or_default().to_string(),
            router_id: doc.get("router_id").and_then(Value::as_str).map(str::to_string),
            prefix: doc.get("prefix").and_then(Value::as_str).map(str::to_string),
            name: doc.get("name").and_then(Value::as_str).map(str::to_string),
            sids: Self::first_sid(doc),
        }
    }

    fn walk_edge(edge: &Value) -> WalkEdge {
        WalkEdge {
            key: edge.get("_key").and_then(Value::as_str).unwrap_or_default().to_string(),
            latency: edge.get("unidir_link_delay").and_then(Value::as_f64),
            percent_util: edge.get("percent_util_out").and_then(Value::as_f64),
            load: edge.get("load").and_then(Value::as_f64),
            country_codes: edge
                .get("country_codes")
                .and_then(Value::as_array)
                .map(|codes| {
                    codes
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                }),
        }
    }

    fn walk_record(&self, path: &MemPath) -> WalkRecord {
        let docs: Vec<Value> = path
            .vertex_ids
            .iter()
            .filter_map(|id| self.document(id))
            .collect();
        let latencies: Vec<f64> = path
            .edges
            .iter()
            .filter_map(|e| e.get("unidir_link_delay").and_then(Value::as_f64))
            .collect();
        let utils: Vec<f64> = path
            .edges
            .iter()
            .filter_map(|e| e.get("percent_util_out").and_then(Value::as_f64))
            .collect();
        let loads: Vec<f64> = path
            .edges
            .iter()
            .filter_map(|e| e.get("load").and_then(Value::as_f64))
            .collect();
        let average = |values: &[f64]| {
            if values.is_empty() {
                None
            } else {
                Some(values.iter().sum::<f64>() / values.len() as f64)
            }
        };

        WalkRecord {
            path: docs
                .iter()
                .map(|d| d.get("_key").and_then(Value::as_str).unwrap_or_default().to_string())
                .collect(),
            sids: docs.iter().map(Self::first_sid).collect(),
            country_codes: path
                .edges
                .iter()
                .map(|e| {
                    e.get("country_codes").and_then(Value::as_array).map(|codes| {
                        codes
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                })
                .collect(),
            metrics: WalkMetrics {
                total_latency: Some(latencies.iter().sum()),
                avg_util: average(&utils),
                load: average(&loads),
                hop_count: path.edges.len() as u32,
            },
            vertices: docs.iter().map(Self::vertex_brief).collect(),
            edges: path.edges.iter().map(Self::walk_edge).collect(),
        }
    }

    fn require_collection(&self, name: &str) -> Result<(), StoreError> {
        if self.collections.read().unwrap().contains_key(name) {
            Ok(())
        } else {
            Err(StoreError::UnknownCollection(name.to_string()))
        }
    }

    fn vpn_docs(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        self.require_collection(collection)?;
        Ok(self
            .collections
            .read()
            .unwrap()
            .get(collection)
            .map(|c| c.docs.values().cloned().collect())
            .unwrap_or_default())
    }

    fn communities(doc: &Value) -> Vec<String> {
        doc.pointer("/base_attrs/ext_community_list")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    }

    fn vpn_row(doc: &Value) -> VpnPrefixRow {
        VpnPrefixRow {
            key: doc.get("_key").and_then(Value::as_str).unwrap_or_default().to_string(),
            prefix: doc.get("prefix").and_then(Value::as_str).map(str::to_string),
            prefix_len: doc
                .get("prefix_len")
                .and_then(Value::as_u64)
                .map(|len| len as u8),
            vpn_rd: doc.get("vpn_rd").and_then(Value::as_str).map(str::to_string),
            nexthop: doc.get("nexthop").and_then(Value::as_str).map(str::to_string),
            labels: doc.get("labels").and_then(Value::as_array).map(|labels| {
                labels.iter().filter_map(Value::as_u64).collect()
            }),
            peer_asn: doc
                .get("peer_asn")
                .and_then(Value::as_u64)
                .map(|asn| asn as u32),
            route_targets: Self::communities(doc)
                .into_iter()
                .filter_map(|c| c.strip_prefix("rt=").map(str::to_string))
                .collect(),
            srv6_sid: doc
                .pointer("/prefix_sid/srv6_l3_service/sub_tlvs/1/0/sid")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }

    fn vpn_filter_matches(doc: &Value, filter: &VpnPrefixFilter) -> bool {
        let nexthop = doc.get("nexthop").and_then(Value::as_str);
        match filter {
            VpnPrefixFilter::ByPe { pe_router } => nexthop == Some(pe_router.as_str()),
            VpnPrefixFilter::ByRouteTarget { route_target } => {
                Self::communities(doc).contains(&format!("rt={route_target}"))
            }
            VpnPrefixFilter::ByPeAndRouteTarget {
                pe_router,
                route_target,
            } => {
                nexthop == Some(pe_router.as_str())
                    && Self::communities(doc).contains(&format!("rt={route_target}"))
            }
            VpnPrefixFilter::Search {
                prefix,
                prefix_exact,
                route_target,
                vpn_rd,
            } => {
                let doc_prefix = doc.get("prefix").and_then(Value::as_str).unwrap_or("");
                if let Some(prefix) = prefix {
                    let matched = if *prefix_exact {
                        doc_prefix == prefix
                    } else {
                        doc_prefix.contains(prefix.as_str())
                    };
                    if !matched {
                        return false;
                    }
                }
                if let Some(route_target) = route_target {
                    if !Self::communities(doc).contains(&format!("rt={route_target}")) {
                        return false;
                    }
                }
                if let Some(vpn_rd) = vpn_rd {
                    if doc.get("vpn_rd").and_then(Value::as_str) != Some(vpn_rd.as_str()) {
                        return false;
                    }
                }
                true
            }
        }
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn has_collection(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.collections.read().unwrap().contains_key(name))
    }

    async fn list_collections(&self) -> Result<Vec<CollectionMeta>, StoreError> {
        Ok(self
            .collections
            .read()
            .unwrap()
            .iter()
            .map(|(name, collection)| CollectionMeta {
                name: name.clone(),
                kind: collection.kind,
                status: "loaded".to_string(),
                count: collection.docs.len() as u64,
            })
            .collect())
    }

    async fn collection_meta(&self, name: &str) -> Result<CollectionMeta, StoreError> {
        let collections = self.collections.read().unwrap();
        let collection = collections
            .get(name)
            .ok_or_else(|| StoreError::UnknownCollection(name.to_string()))?;
        Ok(CollectionMeta {
            name: name.to_string(),
            kind: collection.kind,
            status: "loaded".to_string(),
            count: collection.docs.len() as u64,
        })
    }

    async fn scan(&self, collection: &str, opts: &ScanOptions) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read().unwrap();
        let entry = collections
            .get(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;
        let skip = opts.skip.unwrap_or(0) as usize;
        let limit = opts.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(entry
            .docs
            .values()
            .filter(|doc| match &opts.filter_key {
                Some(key) => doc.get("_key").and_then(Value::as_str) == Some(key.as_str()),
                None => true,
            })
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn scan_keys(&self, collection: &str) -> Result<Vec<String>, StoreError> {
        self.require_collection(collection)?;
        let collections = self.collections.read().unwrap();
        Ok(collections
            .get(collection)
            .map(|c| c.docs.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_document(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Value>, StoreError> {
        self.require_collection(collection)?;
        let collections = self.collections.read().unwrap();
        Ok(collections
            .get(collection)
            .and_then(|c| c.docs.get(key))
            .cloned())
    }

    async fn update_document(
        &self,
        collection: &str,
        key: &str,
        patch: Value,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().unwrap();
        let doc = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?
            .docs
            .get_mut(key)
            .ok_or_else(|| StoreError::Rejected(format!("document {collection}/{key} not found")))?;
        if let (Some(target), Some(fields)) = (doc.as_object_mut(), patch.as_object()) {
            for (field, value) in fields {
                target.insert(field.clone(), value.clone());
            }
        }
        Ok(())
    }

    async fn edge_connections(
        &self,
        graph: &str,
        nodes_only: bool,
    ) -> Result<Vec<Value>, StoreError> {
        Ok(self
            .edge_docs(graph)?
            .into_iter()
            .filter(|edge| {
                if !nodes_only {
                    return true;
                }
                let from = edge.get("_from").and_then(Value::as_str).unwrap_or("");
                let to = edge.get("_to").and_then(Value::as_str).unwrap_or("");
                from.contains("node") && to.contains("node")
            })
            .collect())
    }

    async fn vertices_by_algo(
        &self,
        graph: &str,
        algo: u32,
        nodes_only: bool,
    ) -> Result<Vec<AlgoVertex>, StoreError> {
        let edges = self.edge_connections(graph, nodes_only).await?;
        let mut seen = BTreeSet::new();
        let mut vertex_ids = Vec::new();
        for edge in &edges {
            for side in ["_from", "_to"] {
                if let Some(id) = edge.get(side).and_then(Value::as_str) {
                    if seen.insert(id.to_string()) {
                        vertex_ids.push(id.to_string());
                    }
                }
            }
        }

        let mut vertices = Vec::new();
        for vertex_id in vertex_ids {
            let Some(doc) = self.document(&vertex_id) else {
                continue;
            };
            let Some(sids) = jalapeno_kernel::algo::document_sids(&doc) else {
                continue;
            };
            let matching: Vec<AlgoSid> = sids
                .iter()
                .filter(|sid| jalapeno_kernel::algo::sid_matches(sid, algo))
                .map(|sid| {
                    let behavior = sid.srv6_endpoint_behavior.as_ref();
                    AlgoSid {
                        srv6_sid: sid.srv6_sid.clone(),
                        algo,
                        endpoint_behavior: behavior.and_then(|b| b.endpoint_behavior),
                        flag: behavior.and_then(|b| b.flag),
                    }
                })
                .collect();
            if matching.is_empty() {
                continue;
            }
            let collection = vertex_id.split('/').next().unwrap_or_default().to_string();
            vertices.push(AlgoVertex {
                id: vertex_id.clone(),
                key: doc
                    .get("_key")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                collection,
                name: doc.get("name").and_then(Value::as_str).map(str::to_string),
                router_id: doc
                    .get("router_id")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                sids: matching,
            });
        }
        Ok(vertices)
    }

    async fn shortest_path(&self, spec: &PathSpec) -> Result<Option<RawPath>, StoreError> {
        let adjacency = self.adjacency(&spec.graph, spec.direction)?;
        match self.cheapest_path(spec, &adjacency) {
            Some(path) => Ok(Some(self.to_raw_path(&path)?)),
            None => Ok(None),
        }
    }

    async fn k_shortest_paths(
        &self,
        spec: &PathSpec,
        k: u32,
    ) -> Result<Vec<RawPath>, StoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let adjacency = self.adjacency(&spec.graph, spec.direction)?;

        let mut candidates = if spec.source == spec.destination {
            if self.document(&spec.source).is_none() {
                return Ok(Vec::new());
            }
            vec![MemPath {
                vertex_ids: vec![spec.source.clone()],
                edges: Vec::new(),
            }]
        } else {
            // A simple path has at most one edge per vertex with outgoing
            // adjacency, so the key count bounds the frontier depth.
            self.simple_paths(
                &adjacency,
                &spec.source,
                1,
                adjacency.len(),
                Some(&spec.destination),
            )
        };

        // Rank by total weight, hop count breaking ties; enumeration order
        // keeps the sort stable beyond that.
        candidates.sort_by(|a, b| {
            let weight_a: f64 = a.edges.iter().map(|e| Self::edge_weight(e, spec.weight)).sum();
            let weight_b: f64 = b.edges.iter().map(|e| Self::edge_weight(e, spec.weight)).sum();
            weight_a
                .partial_cmp(&weight_b)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.edges.len().cmp(&b.edges.len()))
        });

        let mut paths = Vec::new();
        for candidate in candidates {
            if !self.satisfies_constraints(&candidate, spec.algo, &spec.excluded_countries) {
                continue;
            }
            paths.push(self.to_raw_path(&candidate)?);
            if paths.len() as u32 == k {
                break;
            }
        }
        Ok(paths)
    }

    async fn fixed_depth_paths(&self, spec: &FixedDepthSpec) -> Result<Vec<RawPath>, StoreError> {
        if spec.limit == 0 {
            return Ok(Vec::new());
        }
        let adjacency = self.adjacency(&spec.graph, spec.direction)?;
        let depth = spec.hopcount as usize;
        let candidates = self.simple_paths(
            &adjacency,
            &spec.source,
            depth,
            depth,
            Some(&spec.destination),
        );
        candidates
            .iter()
            .filter(|path| path.edges.len() == depth)
            .take(spec.limit as usize)
            .map(|path| self.to_raw_path(path))
            .collect()
    }

    async fn traverse(&self, spec: &TraversalSpec) -> Result<Vec<WalkRecord>, StoreError> {
        let adjacency = self.adjacency(&spec.graph, spec.direction)?;
        let walks = self.simple_paths(
            &adjacency,
            &spec.source,
            spec.min_depth as usize,
            spec.max_depth as usize,
            spec.destination.as_deref(),
        );
        Ok(walks.iter().map(|walk| self.walk_record(walk)).collect())
    }

    async fn neighbors(&self, spec: &NeighborSpec) -> Result<Vec<NeighborRecord>, StoreError> {
        let adjacency = self.adjacency(&spec.graph, spec.direction)?;
        let mut visited = BTreeSet::from([spec.source.clone()]);
        let mut queue = VecDeque::from([(spec.source.clone(), 0u32)]);
        let mut records = Vec::new();

        while let Some((vertex, depth)) = queue.pop_front() {
            if depth == spec.depth {
                continue;
            }
            for (next, edge) in adjacency.get(&vertex).into_iter().flatten() {
                if !visited.insert(next.clone()) {
                    continue;
                }
                if let Some(doc) = self.document(next) {
                    records.push(NeighborRecord {
                        neighbor: Self::vertex_brief(&doc),
                        edge: Self::walk_edge(edge),
                        metrics: NeighborMetrics {
                            hop_count: depth + 1,
                        },
                    });
                }
                queue.push_back((next.clone(), depth + 1));
            }
        }
        Ok(records)
    }

    async fn vpn_summary(&self, collection: &str) -> Result<VpnSummary, StoreError> {
        let docs = self.vpn_docs(collection)?;
        let mut rds = BTreeSet::new();
        let mut targets = BTreeSet::new();
        let mut nexthops = BTreeSet::new();
        let mut asns = BTreeSet::new();
        let mut labels = BTreeSet::new();
        for doc in &docs {
            rds.insert(doc.get("vpn_rd").cloned().unwrap_or(Value::Null).to_string());
            nexthops.insert(doc.get("nexthop").cloned().unwrap_or(Value::Null).to_string());
            asns.insert(doc.get("peer_asn").cloned().unwrap_or(Value::Null).to_string());
            for community in Self::communities(doc) {
                if community.starts_with("rt=") {
                    targets.insert(community);
                }
            }
            for label in doc
                .get("labels")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
            {
                labels.insert(label.to_string());
            }
        }
        Ok(VpnSummary {
            total_prefixes: docs.len() as u64,
            unique_rd_count: rds.len() as u64,
            unique_route_target_count: targets.len() as u64,
            unique_nexthop_count: nexthops.len() as u64,
            unique_peer_asn_count: asns.len() as u64,
            unique_label_count: labels.len() as u64,
        })
    }

    async fn pe_routers(&self, collection: &str) -> Result<Vec<PeRouterCount>, StoreError> {
        let docs = self.vpn_docs(collection)?;
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for doc in &docs {
            if let Some(nexthop) = doc.get("nexthop").and_then(Value::as_str) {
                *counts.entry(nexthop.to_string()).or_default() += 1;
            }
        }
        Ok(counts
            .into_iter()
            .map(|(pe_router, prefix_count)| PeRouterCount {
                pe_router,
                prefix_count,
            })
            .collect())
    }

    async fn route_targets(&self, collection: &str) -> Result<Vec<RouteTargetCount>, StoreError> {
        let docs = self.vpn_docs(collection)?;
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for doc in &docs {
            for community in Self::communities(doc) {
                if let Some(target) = community.strip_prefix("rt=") {
                    *counts.entry(target.to_string()).or_default() += 1;
                }
            }
        }
        Ok(counts
            .into_iter()
            .map(|(route_target, prefix_count)| RouteTargetCount {
                route_target,
                prefix_count,
            })
            .collect())
    }

    async fn vpn_prefixes(
        &self,
        collection: &str,
        filter: &VpnPrefixFilter,
        limit: u64,
    ) -> Result<(u64, Vec<VpnPrefixRow>), StoreError> {
        let docs = self.vpn_docs(collection)?;
        let matching: Vec<&Value> = docs
            .iter()
            .filter(|doc| Self::vpn_filter_matches(doc, filter))
            .collect();
        let total = matching.len() as u64;
        let rows = matching
            .into_iter()
            .take(limit as usize)
            .map(Self::vpn_row)
            .collect();
        Ok((total, rows))
    }
}

// =============================================================================
// Tests
// =============================================================================
