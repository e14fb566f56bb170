//! AQL rendering for [`ArangoStore`](super::ArangoStore).
//!
//! Every user-supplied value travels as a bind variable; collection names
//! bind as `@@collection` variables and are additionally checked against a
//! strict name grammar before a query is built. The only text interpolated
//! into query strings comes from closed enumerations (direction keywords,
//! weight attribute names).

use jalapeno_kernel::entity::{Direction, WeightAttribute};
use jalapeno_kernel::store::{
    FixedDepthSpec, NeighborSpec, PathSpec, ScanOptions, StoreError, TraversalSpec,
    VpnPrefixFilter,
};
use serde_json::{Map, Value, json};

/// A rendered query plus its bind variables.
#[derive(Debug, Clone, PartialEq)]
pub struct AqlQuery {
    pub text: String,
    pub bind_vars: Map<String, Value>,
}

impl AqlQuery {
    fn new(text: impl Into<String>) -> Self {
        AqlQuery {
            text: text.into(),
            bind_vars: Map::new(),
        }
    }

    fn bind(mut self, name: &str, value: Value) -> Self {
        self.bind_vars.insert(name.to_string(), value);
        self
    }
}

/// Collection names the adapter will talk to: leading alphanumeric, then
/// alphanumerics, `_`, or `-`. Everything else is refused before any query
/// is built.
pub fn validate_collection(name: &str) -> Result<(), StoreError> {
    let valid = !name.is_empty()
        && name.len() <= 256
        && name.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidCollection(name.to_string()))
    }
}

fn vertex_projection(var: &str) -> String {
    format!(
        "{{ _id: {var}._id, _key: {var}._key, name: {var}.name, router_id: {var}.router_id, \
         ipv4_address: {var}.ipv4_address, ipv6_address: {var}.ipv6_address, \
         prefix: {var}.prefix, prefix_len: {var}.prefix_len, asn: {var}.asn, sids: {var}.sids }}"
    )
}

fn edge_projection(var: &str) -> String {
    format!(
        "{{ _id: {var}._id, _key: {var}._key, _from: {var}._from, _to: {var}._to, \
         latency: {var}.latency, percent_util_out: {var}.percent_util_out, \
         load: {var}.load, country_codes: {var}.country_codes }}"
    )
}

fn weight_options(weight: Option<WeightAttribute>) -> String {
    match weight {
        Some(attr) => format!(
            "OPTIONS {{ weightAttribute: '{}', defaultWeight: 1 }}\n",
            attr.key()
        ),
        None => String::new(),
    }
}

/// The per-path Flex-Algo constraint: every IGP vertex on the path must
/// advertise a SID for `@algo`.
fn algo_filter(path_var: &str) -> String {
    format!(
        r#"LET igp_nodes = (
    FOR v IN {path_var}.vertices
        FILTER CONTAINS(v._id, 'igp_node')
        RETURN v
)
LET supported = (
    FOR node IN igp_nodes
        FILTER HAS(node, 'sids') AND node.sids != null
        FILTER LENGTH(
            FOR sid IN node.sids
                FILTER HAS(sid, 'srv6_endpoint_behavior')
                FILTER sid.srv6_endpoint_behavior.algo == @algo
                RETURN sid
        ) > 0
        RETURN node
)
FILTER LENGTH(igp_nodes) == LENGTH(supported)
"#
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Path search
// ─────────────────────────────────────────────────────────────────────────────

pub fn shortest_path(spec: &PathSpec) -> Result<AqlQuery, StoreError> {
    validate_collection(&spec.graph)?;
    let text = format!(
        r#"WITH igp_node
LET steps = (
    FOR v, e IN {dir} SHORTEST_PATH @source TO @destination @@graph
        {options}RETURN {{
            vertex: {vertex},
            edge: e == null ? null : {edge}
        }}
)
FILTER LENGTH(steps) > 0
RETURN {{
    vertices: steps[*].vertex,
    edges: (FOR s IN steps FILTER s.edge != null RETURN s.edge)
}}"#,
        dir = spec.direction.as_query(),
        options = weight_options(spec.weight),
        vertex = vertex_projection("v"),
        edge = edge_projection("e"),
    );
    Ok(AqlQuery::new(text)
        .bind("source", json!(spec.source))
        .bind("destination", json!(spec.destination))
        .bind("@graph", json!(spec.graph)))
}

pub fn k_shortest_paths(spec: &PathSpec, k: u32) -> Result<AqlQuery, StoreError> {
    validate_collection(&spec.graph)?;

    let mut filters = String::new();
    if spec.algo != 0 {
        filters.push_str(&algo_filter("p"));
    }
    if !spec.excluded_countries.is_empty() {
        filters.push_str(
            "FILTER LENGTH(INTERSECTION(FLATTEN(p.edges[*].country_codes), @excluded)) == 0\n",
        );
    }

    let text = format!(
        r#"WITH igp_node
FOR p IN {dir} K_SHORTEST_PATHS @source TO @destination @@graph
    {options}{filters}LIMIT @k
    RETURN {{
        vertices: (FOR v IN p.vertices RETURN {vertex}),
        edges: (FOR e IN p.edges RETURN {edge})
    }}"#,
        dir = spec.direction.as_query(),
        options = weight_options(spec.weight),
        filters = filters,
        vertex = vertex_projection("v"),
        edge = edge_projection("e"),
    );

    let mut query = AqlQuery::new(text)
        .bind("source", json!(spec.source))
        .bind("destination", json!(spec.destination))
        .bind("@graph", json!(spec.graph))
        .bind("k", json!(k));
    if spec.algo != 0 {
        query = query.bind("algo", json!(spec.algo));
    }
    if !spec.excluded_countries.is_empty() {
        query = query.bind("excluded", json!(spec.excluded_countries));
    }
    Ok(query)
}

pub fn fixed_depth_paths(spec: &FixedDepthSpec) -> Result<AqlQuery, StoreError> {
    validate_collection(&spec.graph)?;
    let text = format!(
        r#"WITH igp_node
FOR v, e, p IN @hops..@hops {dir} @source @@graph
    OPTIONS {{ uniqueVertices: 'path', bfs: true }}
    FILTER v._id == @destination
    LIMIT @limit
    RETURN {{
        vertices: (FOR pv IN p.vertices RETURN {vertex}),
        edges: (FOR pe IN p.edges RETURN {edge})
    }}"#,
        dir = spec.direction.as_query(),
        vertex = vertex_projection("pv"),
        edge = edge_projection("pe"),
    );
    Ok(AqlQuery::new(text)
        .bind("source", json!(spec.source))
        .bind("destination", json!(spec.destination))
        .bind("@graph", json!(spec.graph))
        .bind("hops", json!(spec.hopcount))
        .bind("limit", json!(spec.limit)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Traversal and neighborhood
// ─────────────────────────────────────────────────────────────────────────────

pub fn traverse(spec: &TraversalSpec) -> Result<AqlQuery, StoreError> {
    validate_collection(&spec.graph)?;
    let destination_filter = if spec.destination.is_some() {
        "FILTER v._id == @destination\n    "
    } else {
        ""
    };
    let text = format!(
        r#"FOR v, e, p IN @min..@max {dir} @source @@graph
    OPTIONS {{ uniqueVertices: 'path', bfs: true }}
    {destination_filter}RETURN DISTINCT {{
        path: p.vertices[*]._key,
        sids: p.vertices[*].sids[0].srv6_sid,
        country_codes: p.edges[*].country_codes,
        metrics: {{
            total_latency: SUM(p.edges[*].unidir_link_delay),
            avg_util: AVG(p.edges[*].percent_util_out),
            load: AVG(p.edges[*].load),
            hop_count: LENGTH(p.vertices) - 1
        }},
        vertices: (
            FOR vertex IN p.vertices
            RETURN {{
                _id: vertex._id,
                _key: vertex._key,
                router_id: vertex.router_id,
                prefix: vertex.prefix,
                name: vertex.name,
                sids: vertex.sids[0].srv6_sid
            }}
        ),
        edges: (
            FOR edge IN p.edges
            RETURN {{
                _key: edge._key,
                latency: edge.unidir_link_delay,
                percent_util: edge.percent_util_out,
                load: edge.load,
                country_codes: edge.country_codes
            }}
        )
    }}"#,
        dir = spec.direction.as_query(),
    );
    let mut query = AqlQuery::new(text)
        .bind("source", json!(spec.source))
        .bind("@graph", json!(spec.graph))
        .bind("min", json!(spec.min_depth))
        .bind("max", json!(spec.max_depth));
    if let Some(destination) = &spec.destination {
        query = query.bind("destination", json!(destination));
    }
    Ok(query)
}

pub fn neighbors(spec: &NeighborSpec) -> Result<AqlQuery, StoreError> {
    validate_collection(&spec.graph)?;
    let text = format!(
        r#"FOR v, e, p IN 1..@depth {dir} @source @@graph
    OPTIONS {{ uniqueVertices: 'path' }}
    RETURN DISTINCT {{
        neighbor: {{
            _id: v._id,
            _key: v._key,
            router_id: v.router_id,
            prefix: v.prefix,
            name: v.name,
            sids: v.sids[0].srv6_sid
        }},
        edge: {{
            _key: e._key,
            latency: e.unidir_link_delay,
            percent_util: e.percent_util_out,
            load: e.load,
            country_codes: e.country_codes
        }},
        metrics: {{ hop_count: LENGTH(p.vertices) - 1 }}
    }}"#,
        dir = spec.direction.as_query(),
    );
    Ok(AqlQuery::new(text)
        .bind("source", json!(spec.source))
        .bind("@graph", json!(spec.graph))
        .bind("depth", json!(spec.depth)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Inventory
// ─────────────────────────────────────────────────────────────────────────────

pub fn edge_connections(graph: &str, nodes_only: bool) -> Result<AqlQuery, StoreError> {
    validate_collection(graph)?;
    let node_filter = if nodes_only {
        "FILTER CONTAINS(edge._from, 'node') AND CONTAINS(edge._to, 'node')\n    "
    } else {
        ""
    };
    let text = format!(
        "FOR edge IN @@graph\n    {node_filter}RETURN edge"
    );
    Ok(AqlQuery::new(text).bind("@graph", json!(graph)))
}

pub fn vertices_by_algo(graph: &str, algo: u32, nodes_only: bool) -> Result<AqlQuery, StoreError> {
    validate_collection(graph)?;
    let node_filter = if nodes_only {
        "FILTER CONTAINS(edge._from, 'node') AND CONTAINS(edge._to, 'node')\n    "
    } else {
        ""
    };
    let text = format!(
        r#"FOR edge IN @@graph
    {node_filter}FOR vertex_id IN UNION_DISTINCT([edge._from], [edge._to])
        LET vertex = DOCUMENT(vertex_id)
        FILTER vertex != null
        FILTER HAS(vertex, 'sids') AND vertex.sids != null
        FILTER LENGTH(
            FOR sid IN vertex.sids
                FILTER HAS(sid, 'srv6_endpoint_behavior')
                FILTER sid.srv6_endpoint_behavior.algo == @algo
                RETURN sid
        ) > 0
        RETURN DISTINCT {{
            _id: vertex._id,
            _key: vertex._key,
            collection: PARSE_IDENTIFIER(vertex._id).collection,
            name: vertex.name,
            router_id: vertex.router_id,
            sids: (
                FOR sid IN vertex.sids
                    FILTER HAS(sid, 'srv6_endpoint_behavior')
                    FILTER sid.srv6_endpoint_behavior.algo == @algo
                    RETURN {{
                        srv6_sid: sid.srv6_sid,
                        algo: sid.srv6_endpoint_behavior.algo,
                        endpoint_behavior: sid.srv6_endpoint_behavior.endpoint_behavior,
                        flag: sid.srv6_endpoint_behavior.flag
                    }}
            )
        }}"#
    );
    Ok(AqlQuery::new(text)
        .bind("@graph", json!(graph))
        .bind("algo", json!(algo)))
}

pub fn scan(collection: &str, opts: &ScanOptions) -> Result<AqlQuery, StoreError> {
    validate_collection(collection)?;
    let mut text = String::from("FOR doc IN @@collection\n");
    let mut query_bind: Vec<(&str, Value)> = vec![("@collection", json!(collection))];

    if let Some(key) = &opts.filter_key {
        text.push_str("    FILTER doc._key == @key\n");
        query_bind.push(("key", json!(key)));
    }
    if opts.limit.is_some() || opts.skip.is_some() {
        text.push_str("    LIMIT @skip, @limit\n");
        query_bind.push(("skip", json!(opts.skip.unwrap_or(0))));
        query_bind.push(("limit", json!(opts.limit.unwrap_or(u32::MAX as u64))));
    }
    text.push_str("    RETURN doc");

    let mut query = AqlQuery::new(text);
    for (name, value) in query_bind {
        query = query.bind(name, value);
    }
    Ok(query)
}

pub fn scan_keys(collection: &str) -> Result<AqlQuery, StoreError> {
    validate_collection(collection)?;
    Ok(
        AqlQuery::new("FOR doc IN @@collection\n    RETURN doc._key")
            .bind("@collection", json!(collection)),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// L3VPN projections
// ─────────────────────────────────────────────────────────────────────────────

pub fn vpn_summary(collection: &str) -> Result<AqlQuery, StoreError> {
    validate_collection(collection)?;
    let text = r#"LET total_count = LENGTH(@@collection)
LET unique_rds = (
    FOR doc IN @@collection
        COLLECT rd = doc.vpn_rd
        RETURN rd
)
LET unique_route_targets = (
    FOR doc IN @@collection
        FOR rt IN NOT_NULL(doc.base_attrs.ext_community_list, [])
        FILTER STARTS_WITH(rt, 'rt=')
        COLLECT target = rt
        RETURN target
)
LET unique_nexthops = (
    FOR doc IN @@collection
        COLLECT nexthop = doc.nexthop
        RETURN nexthop
)
LET unique_peer_asns = (
    FOR doc IN @@collection
        COLLECT asn = doc.peer_asn
        RETURN asn
)
LET unique_labels = (
    FOR doc IN @@collection
        FOR label IN NOT_NULL(doc.labels, [])
        COLLECT l = label
        RETURN l
)
RETURN {
    total_prefixes: total_count,
    unique_rd_count: LENGTH(unique_rds),
    unique_route_target_count: LENGTH(unique_route_targets),
    unique_nexthop_count: LENGTH(unique_nexthops),
    unique_peer_asn_count: LENGTH(unique_peer_asns),
    unique_label_count: LENGTH(unique_labels)
}"#;
    Ok(AqlQuery::new(text).bind("@collection", json!(collection)))
}

pub fn pe_routers(collection: &str) -> Result<AqlQuery, StoreError> {
    validate_collection(collection)?;
    let text = r#"FOR doc IN @@collection
    COLLECT nexthop = doc.nexthop WITH COUNT INTO count
    RETURN {
        pe_router: nexthop,
        prefix_count: count
    }"#;
    Ok(AqlQuery::new(text).bind("@collection", json!(collection)))
}

pub fn route_targets(collection: &str) -> Result<AqlQuery, StoreError> {
    validate_collection(collection)?;
    let text = r#"FOR doc IN @@collection
    FOR rt IN NOT_NULL(doc.base_attrs.ext_community_list, [])
        FILTER STARTS_WITH(rt, 'rt=')
        LET clean_rt = SUBSTRING(rt, 3)
        COLLECT route_target = clean_rt WITH COUNT INTO count
        RETURN {
            route_target: route_target,
            prefix_count: count
        }"#;
    Ok(AqlQuery::new(text).bind("@collection", json!(collection)))
}

/// Filter clause and bind variables shared by the prefix row and count
/// queries.
fn vpn_prefix_filter(filter: &VpnPrefixFilter) -> (String, Vec<(&'static str, Value)>) {
    let mut clauses = Vec::new();
    let mut binds: Vec<(&'static str, Value)> = Vec::new();
    match filter {
        VpnPrefixFilter::ByPe { pe_router } => {
            clauses.push("FILTER doc.nexthop == @pe_router");
            binds.push(("pe_router", json!(pe_router)));
        }
        VpnPrefixFilter::ByRouteTarget { route_target } => {
            clauses.push("FILTER @route_target IN NOT_NULL(doc.base_attrs.ext_community_list, [])");
            binds.push(("route_target", json!(format!("rt={route_target}"))));
        }
        VpnPrefixFilter::ByPeAndRouteTarget {
            pe_router,
            route_target,
        } => {
            clauses.push("FILTER doc.nexthop == @pe_router");
            clauses.push("FILTER @route_target IN NOT_NULL(doc.base_attrs.ext_community_list, [])");
            binds.push(("pe_router", json!(pe_router)));
            binds.push(("route_target", json!(format!("rt={route_target}"))));
        }
        VpnPrefixFilter::Search {
            prefix,
            prefix_exact,
            route_target,
            vpn_rd,
        } => {
            if let Some(prefix) = prefix {
                if *prefix_exact {
                    clauses.push("FILTER doc.prefix == @prefix");
                } else {
                    clauses.push("FILTER CONTAINS(doc.prefix, @prefix)");
                }
                binds.push(("prefix", json!(prefix)));
            }
            if let Some(route_target) = route_target {
                clauses.push(
                    "FILTER @route_target IN NOT_NULL(doc.base_attrs.ext_community_list, [])",
                );
                binds.push(("route_target", json!(format!("rt={route_target}"))));
            }
            if let Some(vpn_rd) = vpn_rd {
                clauses.push("FILTER doc.vpn_rd == @vpn_rd");
                binds.push(("vpn_rd", json!(vpn_rd)));
            }
        }
    }
    let mut clause_text = String::new();
    for clause in clauses {
        clause_text.push_str("    ");
        clause_text.push_str(clause);
        clause_text.push('\n');
    }
    (clause_text, binds)
}

pub fn vpn_prefixes(
    collection: &str,
    filter: &VpnPrefixFilter,
    limit: u64,
) -> Result<AqlQuery, StoreError> {
    validate_collection(collection)?;
    let (clauses, binds) = vpn_prefix_filter(filter);
    let text = format!(
        r#"FOR doc IN @@collection
{clauses}    LIMIT @limit
    RETURN {{
        _key: doc._key,
        prefix: doc.prefix,
        prefix_len: doc.prefix_len,
        vpn_rd: doc.vpn_rd,
        nexthop: doc.nexthop,
        labels: doc.labels,
        peer_asn: doc.peer_asn,
        route_targets: (
            FOR rt IN NOT_NULL(doc.base_attrs.ext_community_list, [])
            FILTER STARTS_WITH(rt, 'rt=')
            RETURN SUBSTRING(rt, 3)
        ),
        srv6_sid: doc.prefix_sid.srv6_l3_service.sub_tlvs["1"][0].sid
    }}"#
    );
    let mut query = AqlQuery::new(text)
        .bind("@collection", json!(collection))
        .bind("limit", json!(limit));
    for (name, value) in binds {
        query = query.bind(name, value);
    }
    Ok(query)
}

pub fn vpn_prefix_count(
    collection: &str,
    filter: &VpnPrefixFilter,
) -> Result<AqlQuery, StoreError> {
    validate_collection(collection)?;
    let (clauses, binds) = vpn_prefix_filter(filter);
    let text = format!(
        r#"FOR doc IN @@collection
{clauses}    COLLECT AGGREGATE count = COUNT()
    RETURN count"#
    );
    let mut query = AqlQuery::new(text).bind("@collection", json!(collection));
    for (name, value) in binds {
        query = query.bind(name, value);
    }
    Ok(query)
}

// =============================================================================
// Tests
// =============================================================================
