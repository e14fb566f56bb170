//! ArangoDB-backed [`GraphStore`].
//!
//! [`ArangoStore`] speaks the ArangoDB HTTP API directly: AQL through the
//! cursor endpoint (`POST /_api/cursor`, following `hasMore` pages),
//! documents through `/_api/document`, collection metadata through
//! `/_api/collection`. One pooled [`reqwest::Client`] is shared by every
//! request; each call authenticates with basic auth.
//!
//! Transient failures (connect/timeout/5xx) on reads retry with bounded
//! exponential backoff. Writes never retry - a duplicated `load` patch
//! would double-count.

mod aql;

pub use aql::{AqlQuery, validate_collection};

use crate::config::DbSettings;
use async_trait::async_trait;
use jalapeno_kernel::entity::{CollectionKind, CollectionMeta};
use jalapeno_kernel::store::{
    AlgoVertex, FixedDepthSpec, GraphStore, NeighborRecord, NeighborSpec, PathSpec, PeRouterCount,
    RawPath, RouteTargetCount, ScanOptions, StoreError, TraversalSpec, VpnPrefixFilter,
    VpnPrefixRow, VpnSummary, WalkRecord,
};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

/// Per-request timeout toward the database.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Transient read failures retry this many times after the first attempt.
const READ_RETRIES: u32 = 2;
/// First backoff delay; doubles per attempt.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(100);
/// Cursor page size.
const CURSOR_BATCH_SIZE: u32 = 1000;

/// One page of an AQL cursor response.
#[derive(Debug, Deserialize)]
struct CursorPage {
    #[serde(default)]
    result: Vec<Value>,
    #[serde(default, rename = "hasMore")]
    has_more: bool,
    id: Option<String>,
}

/// ArangoDB graph store client.
pub struct ArangoStore {
    client: reqwest::Client,
    base: String,
    username: String,
    password: String,
}

impl ArangoStore {
    /// Build a store from validated settings. The connection itself is
    /// lazy - the first request opens it.
    pub fn new(settings: &DbSettings) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Unavailable(format!("could not build HTTP client: {e}")))?;
        let base = format!(
            "{}/_db/{}",
            settings.database_server.trim_end_matches('/'),
            settings.database_name
        );
        Ok(ArangoStore {
            client,
            base,
            username: settings.username.clone(),
            password: settings.password.clone(),
        })
    }

    fn transport(err: reqwest::Error) -> StoreError {
        StoreError::Unavailable(err.to_string())
    }

    /// Translate a non-success response into the store error taxonomy.
    fn classify(status: StatusCode, body: &Value) -> StoreError {
        let message = body
            .get("errorMessage")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {status}"));
        let error_num = body.get("errorNum").and_then(Value::as_u64).unwrap_or(0);
        match status.as_u16() {
            401 | 403 => StoreError::Unavailable(format!("authentication failed: {message}")),
            // 1203: collection or view not found
            404 if error_num == 1203 => StoreError::UnknownCollection(message),
            400..=499 => StoreError::Rejected(message),
            _ => StoreError::Unavailable(message),
        }
    }

    /// GET with transient-failure retry. Returns the status and the parsed
    /// body; callers interpret non-success statuses.
    async fn get(&self, url: &str) -> Result<(StatusCode, Value), StoreError> {
        let mut attempt = 0;
        loop {
            let result = self
                .client
                .get(url)
                .basic_auth(&self.username, Some(&self.password))
                .send()
                .await;
            match result {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_server_error() && attempt < READ_RETRIES {
                        attempt += 1;
                        warn!(%url, %status, attempt, "graph store returned a server error, backing off");
                        tokio::time::sleep(RETRY_BASE_DELAY * 2u32.pow(attempt - 1)).await;
                        continue;
                    }
                    let body = resp.json::<Value>().await.unwrap_or(Value::Null);
                    return Ok((status, body));
                }
                Err(err) if attempt < READ_RETRIES => {
                    attempt += 1;
                    warn!(%url, error = %err, attempt, "graph store unreachable, backing off");
                    tokio::time::sleep(RETRY_BASE_DELAY * 2u32.pow(attempt - 1)).await;
                }
                Err(err) => return Err(Self::transport(err)),
            }
        }
    }

    /// Execute one AQL query, following cursor pages, with read retry.
    async fn run_query(&self, query: &AqlQuery) -> Result<Vec<Value>, StoreError> {
        let mut attempt = 0;
        loop {
            match self.run_query_once(query).await {
                Err(err) if err.is_transient() && attempt < READ_RETRIES => {
                    attempt += 1;
                    warn!(error = %err, attempt, "query failed transiently, backing off");
                    tokio::time::sleep(RETRY_BASE_DELAY * 2u32.pow(attempt - 1)).await;
                }
                other => return other,
            }
        }
    }

    async fn run_query_once(&self, query: &AqlQuery) -> Result<Vec<Value>, StoreError> {
        let url = format!("{}/_api/cursor", self.base);
        debug!(query = %query.text.lines().next().unwrap_or(""), "executing AQL query");

        let resp = self
            .client
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&json!({
                "query": query.text,
                "bindVars": query.bind_vars,
                "batchSize": CURSOR_BATCH_SIZE,
            }))
            .send()
            .await
            .map_err(Self::transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.json::<Value>().await.unwrap_or(Value::Null);
            return Err(Self::classify(status, &body));
        }

        let mut page: CursorPage = resp
            .json()
            .await
            .map_err(|e| StoreError::Rejected(format!("malformed cursor response: {e}")))?;
        let mut rows = std::mem::take(&mut page.result);

        while page.has_more {
            let id = page
                .id
                .as_deref()
                .ok_or_else(|| StoreError::Rejected("cursor page missing id".to_string()))?;
            let next_url = format!("{}/_api/cursor/{}", self.base, id);
            let resp = self
                .client
                .post(&next_url)
                .basic_auth(&self.username, Some(&self.password))
                .send()
                .await
                .map_err(Self::transport)?;
            let status = resp.status();
            if !status.is_success() {
                let body = resp.json::<Value>().await.unwrap_or(Value::Null);
                return Err(Self::classify(status, &body));
            }
            page = resp
                .json()
                .await
                .map_err(|e| StoreError::Rejected(format!("malformed cursor page: {e}")))?;
            rows.append(&mut page.result);
        }

        Ok(rows)
    }

    async fn collection_count(&self, name: &str) -> Result<u64, StoreError> {
        let url = format!("{}/_api/collection/{}/count", self.base, name);
        let (status, body) = self.get(&url).await?;
        if !status.is_success() {
            return Err(Self::classify(status, &body));
        }
        Ok(body.get("count").and_then(Value::as_u64).unwrap_or(0))
    }

    fn meta_from_body(name: &str, body: &Value, count: u64) -> CollectionMeta {
        let kind = match body.get("type").and_then(Value::as_u64) {
            Some(3) => CollectionKind::Edge,
            _ => CollectionKind::Document,
        };
        let status = match body.get("status").and_then(Value::as_u64) {
            Some(1) => "new-born",
            Some(2) => "unloaded",
            Some(3) => "loaded",
            Some(4) => "unloading",
            Some(5) => "deleted",
            Some(6) => "loading",
            _ => "unknown",
        };
        CollectionMeta {
            name: name.to_string(),
            kind,
            status: status.to_string(),
            count,
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(row: Value) -> Result<T, StoreError> {
    serde_json::from_value(row)
        .map_err(|e| StoreError::Rejected(format!("unexpected result shape: {e}")))
}

fn decode_rows<T: serde::de::DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, StoreError> {
    rows.into_iter().map(decode).collect()
}

#[async_trait]
impl GraphStore for ArangoStore {
    async fn has_collection(&self, name: &str) -> Result<bool, StoreError> {
        validate_collection(name)?;
        let url = format!("{}/_api/collection/{}", self.base, name);
        let (status, body) = self.get(&url).await?;
        match status {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(Self::classify(status, &body)),
        }
    }

    async fn list_collections(&self) -> Result<Vec<CollectionMeta>, StoreError> {
        let url = format!("{}/_api/collection?excludeSystem=true", self.base);
        let (status, body) = self.get(&url).await?;
        if !status.is_success() {
            return Err(Self::classify(status, &body));
        }
        let entries = body
            .get("result")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut collections = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(name) = entry.get("name").and_then(Value::as_str) else {
                continue;
            };
            if name.starts_with('_') {
                continue;
            }
            let count = self.collection_count(name).await?;
            collections.push(Self::meta_from_body(name, &entry, count));
        }
        collections.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(collections)
    }

    async fn collection_meta(&self, name: &str) -> Result<CollectionMeta, StoreError> {
        validate_collection(name)?;
        let url = format!("{}/_api/collection/{}", self.base, name);
        let (status, body) = self.get(&url).await?;
        match status {
            StatusCode::OK => {
                let count = self.collection_count(name).await?;
                Ok(Self::meta_from_body(name, &body, count))
            }
            StatusCode::NOT_FOUND => Err(StoreError::UnknownCollection(name.to_string())),
            _ => Err(Self::classify(status, &body)),
        }
    }

    async fn scan(&self, collection: &str, opts: &ScanOptions) -> Result<Vec<Value>, StoreError> {
        self.run_query(&aql::scan(collection, opts)?).await
    }

    async fn scan_keys(&self, collection: &str) -> Result<Vec<String>, StoreError> {
        let rows = self.run_query(&aql::scan_keys(collection)?).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.as_str().map(str::to_string))
            .collect())
    }

    async fn get_document(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Value>, StoreError> {
        validate_collection(collection)?;
        let url = format!("{}/_api/document/{}/{}", self.base, collection, key);
        let (status, body) = self.get(&url).await?;
        match status {
            StatusCode::OK => Ok(Some(body)),
            StatusCode::NOT_FOUND => {
                // 1203: the collection itself is missing, not just the key
                if body.get("errorNum").and_then(Value::as_u64) == Some(1203) {
                    Err(StoreError::UnknownCollection(collection.to_string()))
                } else {
                    Ok(None)
                }
            }
            _ => Err(Self::classify(status, &body)),
        }
    }

    async fn update_document(
        &self,
        collection: &str,
        key: &str,
        patch: Value,
    ) -> Result<(), StoreError> {
        validate_collection(collection)?;
        let url = format!("{}/_api/document/{}/{}", self.base, collection, key);
        // Single attempt: a retried patch could apply twice.
        let resp = self
            .client
            .patch(&url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&patch)
            .send()
            .await
            .map_err(Self::transport)?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = resp.json::<Value>().await.unwrap_or(Value::Null);
            Err(Self::classify(status, &body))
        }
    }

    async fn edge_connections(
        &self,
        graph: &str,
        nodes_only: bool,
    ) -> Result<Vec<Value>, StoreError> {
        self.run_query(&aql::edge_connections(graph, nodes_only)?).await
    }

    async fn vertices_by_algo(
        &self,
        graph: &str,
        algo: u32,
        nodes_only: bool,
    ) -> Result<Vec<AlgoVertex>, StoreError> {
        let rows = self
            .run_query(&aql::vertices_by_algo(graph, algo, nodes_only)?)
            .await?;
        decode_rows(rows)
    }

    async fn shortest_path(&self, spec: &PathSpec) -> Result<Option<RawPath>, StoreError> {
        let rows = self.run_query(&aql::shortest_path(spec)?).await?;
        match rows.into_iter().next() {
            Some(row) => {
                let path: RawPath = decode(row)?;
                Ok((!path.vertices.is_empty()).then_some(path))
            }
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
        let rows = self.run_query(&aql::k_shortest_paths(spec, k)?).await?;
        decode_rows(rows)
    }

    async fn fixed_depth_paths(&self, spec: &FixedDepthSpec) -> Result<Vec<RawPath>, StoreError> {
        if spec.limit == 0 {
            return Ok(Vec::new());
        }
        let rows = self.run_query(&aql::fixed_depth_paths(spec)?).await?;
        decode_rows(rows)
    }

    async fn traverse(&self, spec: &TraversalSpec) -> Result<Vec<WalkRecord>, StoreError> {
        let rows = self.run_query(&aql::traverse(spec)?).await?;
        decode_rows(rows)
    }

    async fn neighbors(&self, spec: &NeighborSpec) -> Result<Vec<NeighborRecord>, StoreError> {
        let rows = self.run_query(&aql::neighbors(spec)?).await?;
        decode_rows(rows)
    }

    async fn vpn_summary(&self, collection: &str) -> Result<VpnSummary, StoreError> {
        let rows = self.run_query(&aql::vpn_summary(collection)?).await?;
        match rows.into_iter().next() {
            Some(row) => decode(row),
            None => Ok(VpnSummary::default()),
        }
    }

    async fn pe_routers(&self, collection: &str) -> Result<Vec<PeRouterCount>, StoreError> {
        let rows = self.run_query(&aql::pe_routers(collection)?).await?;
        decode_rows(rows)
    }

    async fn route_targets(&self, collection: &str) -> Result<Vec<RouteTargetCount>, StoreError> {
        let rows = self.run_query(&aql::route_targets(collection)?).await?;
        decode_rows(rows)
    }

    async fn vpn_prefixes(
        &self,
        collection: &str,
        filter: &VpnPrefixFilter,
        limit: u64,
    ) -> Result<(u64, Vec<VpnPrefixRow>), StoreError> {
        let rows = self
            .run_query(&aql::vpn_prefixes(collection, filter, limit)?)
            .await?;
        let prefixes = decode_rows(rows)?;
        let counts = self
            .run_query(&aql::vpn_prefix_count(collection, filter)?)
            .await?;
        let total = counts
            .first()
            .and_then(Value::as_u64)
            .unwrap_or(prefixes.len() as u64);
        Ok((total, prefixes))
    }
}
