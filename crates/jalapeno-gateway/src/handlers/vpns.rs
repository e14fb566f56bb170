//! L3VPN projections.
//!
//! GET /vpns                            - VPN collection listing
//! GET /vpns/{name}                     - one VPN collection's summary
//! GET /vpns/{name}/summary             - prefix/RD/RT/nexthop cardinalities
//! GET /vpns/{name}/pe-routers          - PE routers with prefix counts
//! GET /vpns/{name}/route-targets       - route targets with prefix counts
//! GET /vpns/{name}/prefixes/by-pe      - prefixes advertised by a PE
//! GET /vpns/{name}/prefixes/by-rt      - prefixes carrying a route target
//! GET /vpns/{name}/prefixes/by-pe-rt   - intersection of both filters
//! GET /vpns/{name}/prefixes/search     - flexible prefix search
//!
//! Prefix rows carry synthesized SRv6 service SIDs: the advertised locator
//! combined with each MPLS label's µSID function. Rows whose locator fails
//! the canonical grammar keep their raw fields and lose only the
//! synthesized `sid` (logged at warn).

use crate::error::{ApiError, ApiResult};
use crate::handlers::require_collection;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use jalapeno_kernel::srv6;
use jalapeno_kernel::store::{VpnPrefixFilter, VpnPrefixRow};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use tracing::warn;

/// The L3VPN prefix collections the prefix routes accept.
pub const VPN_PREFIX_COLLECTIONS: [&str; 2] = ["l3vpn_v4_prefix", "l3vpn_v6_prefix"];

fn is_vpn_collection(name: &str) -> bool {
    VPN_PREFIX_COLLECTIONS.contains(&name) || name.starts_with("l3vpn_") || name.starts_with("vpn_")
}

fn require_vpn_collection(name: &str) -> ApiResult<()> {
    if is_vpn_collection(name) {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "Collection {name} is not a VPN collection"
        )))
    }
}

fn require_vpn_prefix_collection(name: &str) -> ApiResult<()> {
    if VPN_PREFIX_COLLECTIONS.contains(&name) {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "Collection {name} is not a VPN prefix collection"
        )))
    }
}

/// Serialize rows, appending the per-label `function` values and the
/// synthesized service `sid` list.
fn enrich_rows(rows: Vec<VpnPrefixRow>) -> Vec<Value> {
    rows.into_iter()
        .map(|row| {
            let mut value = serde_json::to_value(&row).unwrap_or_else(|_| json!({}));
            let Some(labels) = row.labels.as_ref().filter(|labels| !labels.is_empty()) else {
                return value;
            };
            let functions: Vec<String> =
                labels.iter().map(|label| srv6::label_function(*label)).collect();
            if let Some(obj) = value.as_object_mut() {
                obj.insert("function".to_string(), json!(functions));
                if let Some(locator) = &row.srv6_sid {
                    let sids: Vec<String> = functions
                        .iter()
                        .filter_map(|function| match srv6::service_sid(locator, function) {
                            Ok(sid) => Some(sid),
                            Err(err) => {
                                warn!(prefix = %row.key, error = %err, "skipping service SID synthesis");
                                None
                            }
                        })
                        .collect();
                    if !sids.is_empty() {
                        obj.insert("sid".to_string(), json!(sids));
                    }
                }
            }
            value
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /vpns
pub async fn get_vpns(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let collections = state.store.list_collections().await?;
    let vpns: Vec<Value> = collections
        .into_iter()
        .filter(|meta| is_vpn_collection(&meta.name))
        .map(|meta| json!(meta))
        .collect();
    Ok(Json(json!({
        "total_count": vpns.len(),
        "collections": vpns,
    })))
}

/// GET /vpns/{name}
pub async fn get_vpn(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_collection(&state, &name).await?;
    require_vpn_collection(&name)?;
    let meta = state.store.collection_meta(&name).await?;
    Ok(Json(json!(meta)))
}

/// GET /vpns/{name}/summary
pub async fn get_vpn_summary(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_collection(&state, &name).await?;
    require_vpn_collection(&name)?;
    let summary = state.store.vpn_summary(&name).await?;
    let mut body = Map::new();
    body.insert("collection".to_string(), json!(name));
    if let Value::Object(fields) = json!(summary) {
        body.extend(fields);
    }
    Ok(Json(Value::Object(body)))
}

/// GET /vpns/{name}/pe-routers
pub async fn get_pe_routers(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_collection(&state, &name).await?;
    require_vpn_prefix_collection(&name)?;
    let routers = state.store.pe_routers(&name).await?;
    Ok(Json(json!({
        "collection": name,
        "total_pe_routers": routers.len(),
        "pe_routers": routers,
    })))
}

/// GET /vpns/{name}/route-targets
pub async fn get_route_targets(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_collection(&state, &name).await?;
    require_vpn_prefix_collection(&name)?;
    let targets = state.store.route_targets(&name).await?;
    Ok(Json(json!({
        "collection": name,
        "total_route_targets": targets.len(),
        "route_targets": targets,
    })))
}

#[derive(Debug, Deserialize)]
pub struct PrefixQuery {
    pub pe_router: Option<String>,
    pub route_target: Option<String>,
    pub prefix: Option<String>,
    #[serde(default)]
    pub prefix_exact: bool,
    pub vpn_rd: Option<String>,
    pub limit: Option<u64>,
}

fn required(value: Option<String>, name: &str) -> ApiResult<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Validation(format!("missing required parameter: {name}")))
}

/// GET /vpns/{name}/prefixes/by-pe
pub async fn prefixes_by_pe(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<PrefixQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_collection(&state, &name).await?;
    require_vpn_prefix_collection(&name)?;
    let pe_router = required(query.pe_router, "pe_router")?;
    let limit = query.limit.unwrap_or(100);
    let filter = VpnPrefixFilter::ByPe {
        pe_router: pe_router.clone(),
    };
    let (total, rows) = state.store.vpn_prefixes(&name, &filter, limit).await?;
    Ok(Json(json!({
        "collection": name,
        "pe_router": pe_router,
        "total_prefixes": total,
        "prefixes": enrich_rows(rows),
        "limit_applied": limit,
    })))
}

/// GET /vpns/{name}/prefixes/by-rt
pub async fn prefixes_by_rt(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<PrefixQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_collection(&state, &name).await?;
    require_vpn_prefix_collection(&name)?;
    let route_target = required(query.route_target, "route_target")?;
    let limit = query.limit.unwrap_or(100);
    let filter = VpnPrefixFilter::ByRouteTarget {
        route_target: route_target.clone(),
    };
    let (total, rows) = state.store.vpn_prefixes(&name, &filter, limit).await?;

    // Advertising-PE summary over the returned rows.
    let mut by_nexthop: BTreeMap<String, u64> = BTreeMap::new();
    for row in &rows {
        if let Some(nexthop) = &row.nexthop {
            *by_nexthop.entry(nexthop.clone()).or_default() += 1;
        }
    }
    let advertising_pes: Vec<Value> = by_nexthop
        .iter()
        .map(|(nexthop, count)| json!({ "nexthop": nexthop, "prefix_count": count }))
        .collect();

    Ok(Json(json!({
        "collection": name,
        "route_target": route_target,
        "total_prefixes": total,
        "advertising_pe_count": by_nexthop.len(),
        "advertising_pes": advertising_pes,
        "prefixes": enrich_rows(rows),
        "limit_applied": limit,
    })))
}

/// GET /vpns/{name}/prefixes/by-pe-rt
pub async fn prefixes_by_pe_rt(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<PrefixQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_collection(&state, &name).await?;
    require_vpn_prefix_collection(&name)?;
    let pe_router = required(query.pe_router, "pe_router")?;
    let route_target = required(query.route_target, "route_target")?;
    let limit = query.limit.unwrap_or(100);
    let filter = VpnPrefixFilter::ByPeAndRouteTarget {
        pe_router: pe_router.clone(),
        route_target: route_target.clone(),
    };
    let (total, rows) = state.store.vpn_prefixes(&name, &filter, limit).await?;
    Ok(Json(json!({
        "collection": name,
        "pe_router": pe_router,
        "route_target": route_target,
        "total_prefixes": total,
        "prefixes": enrich_rows(rows),
        "limit_applied": limit,
    })))
}

/// GET /vpns/{name}/prefixes/search
pub async fn search_prefixes(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<PrefixQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_collection(&state, &name).await?;
    require_vpn_prefix_collection(&name)?;

    if query.prefix.is_none() && query.route_target.is_none() && query.vpn_rd.is_none() {
        return Err(ApiError::Validation(
            "At least one search parameter (prefix, route_target, or vpn_rd) must be provided"
                .to_string(),
        ));
    }

    let limit = query.limit.unwrap_or(100);
    let filter = VpnPrefixFilter::Search {
        prefix: query.prefix.clone(),
        prefix_exact: query.prefix_exact,
        route_target: query.route_target.clone(),
        vpn_rd: query.vpn_rd.clone(),
    };
    let (total, rows) = state.store.vpn_prefixes(&name, &filter, limit).await?;

    let mut criteria = Map::new();
    if let Some(prefix) = &query.prefix {
        criteria.insert("prefix".to_string(), json!(prefix));
        criteria.insert("prefix_exact".to_string(), json!(query.prefix_exact));
    }
    if let Some(route_target) = &query.route_target {
        criteria.insert("route_target".to_string(), json!(route_target));
    }
    if let Some(vpn_rd) = &query.vpn_rd {
        criteria.insert("vpn_rd".to_string(), json!(vpn_rd));
    }

    Ok(Json(json!({
        "collection": name,
        "search_criteria": criteria,
        "total_prefixes": total,
        "prefixes": enrich_rows(rows),
        "limit_applied": limit,
    })))
}

/// Build the VPN router sub-tree.
pub fn router() -> axum::Router<AppState> {
    use axum::routing::get;
    axum::Router::new()
        .route("/vpns", get(get_vpns))
        .route("/vpns/{name}", get(get_vpn))
        .route("/vpns/{name}/summary", get(get_vpn_summary))
        .route("/vpns/{name}/pe-routers", get(get_pe_routers))
        .route("/vpns/{name}/route-targets", get(get_route_targets))
        .route("/vpns/{name}/prefixes/by-pe", get(prefixes_by_pe))
        .route("/vpns/{name}/prefixes/by-rt", get(prefixes_by_rt))
        .route("/vpns/{name}/prefixes/by-pe-rt", get(prefixes_by_pe_rt))
        .route("/vpns/{name}/prefixes/search", get(search_prefixes))
}
