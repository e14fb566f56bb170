//! Typed projections of graph documents and request enumerations.
//!
//! Graph documents are owned by the ingestion pipeline and arrive as loosely
//! structured JSON. Generic endpoints pass them through opaquely as
//! [`serde_json::Value`]; the path engine and the uSID synthesizer work on
//! the typed projections below, which deserialize the small field set the
//! core actually reads and ignore everything else.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// Request enumerations
// ─────────────────────────────────────────────────────────────────────────────

/// Traversal direction for path search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Outbound,
    Inbound,
    Any,
}

impl Direction {
    /// Case-insensitive parse from a query parameter.
    pub fn from_str_ci(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "outbound" => Some(Direction::Outbound),
            "inbound" => Some(Direction::Inbound),
            "any" => Some(Direction::Any),
            _ => None,
        }
    }

    /// Lowercase form echoed in responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Outbound => "outbound",
            Direction::Inbound => "inbound",
            Direction::Any => "any",
        }
    }

    /// Uppercase form used in traversal queries.
    pub fn as_query(&self) -> &'static str {
        match self {
            Direction::Outbound => "OUTBOUND",
            Direction::Inbound => "INBOUND",
            Direction::Any => "ANY",
        }
    }
}

/// Edge attribute used as the search weight. Absent means plain hop count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightAttribute {
    Latency,
    PercentUtilOut,
    Load,
}

impl WeightAttribute {
    /// The edge document attribute holding the weight value.
    pub fn key(&self) -> &'static str {
        match self {
            WeightAttribute::Latency => "latency",
            WeightAttribute::PercentUtilOut => "percent_util_out",
            WeightAttribute::Load => "load",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Document identity
// ─────────────────────────────────────────────────────────────────────────────

/// A `collection/key` document handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId {
    pub collection: String,
    pub key: String,
}

impl DocumentId {
    /// Split an id of the form `collection/key`. Keys may themselves contain
    /// `/` separators, so only the first one splits.
    pub fn parse(id: &str) -> Option<Self> {
        let (collection, key) = id.split_once('/')?;
        if collection.is_empty() || key.is_empty() {
            return None;
        }
        Some(DocumentId {
            collection: collection.to_string(),
            key: key.to_string(),
        })
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.key)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Collection metadata
// ─────────────────────────────────────────────────────────────────────────────

/// Kind of a collection in the graph store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Document,
    Edge,
}

/// Normalized collection metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CollectionKind,
    pub status: String,
    pub count: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// SID records
// ─────────────────────────────────────────────────────────────────────────────

/// The endpoint behavior block nested inside a SID record. The `algo` field
/// drives Flex-Algorithm participation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointBehavior {
    pub algo: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_behavior: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<u32>,
}

/// One SRv6 SID advertised by a vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srv6_sid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srv6_endpoint_behavior: Option<EndpointBehavior>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Path projections
// ─────────────────────────────────────────────────────────────────────────────

/// Vertex projection carried on path-shaped responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathVertex {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_len: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asn: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sids: Option<Vec<SidRecord>>,
}

impl PathVertex {
    /// Project a raw graph document. Returns `None` when the document lacks
    /// the `_id`/`_key` identity pair.
    pub fn from_document(doc: &Value) -> Option<Self> {
        serde_json::from_value(doc.clone()).ok()
    }
}

/// Edge projection carried on path-shaped responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathEdge {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_from")]
    pub from: String,
    #[serde(rename = "_to")]
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_util_out: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_codes: Option<Vec<String>>,
}

impl PathEdge {
    pub fn from_document(doc: &Value) -> Option<Self> {
        serde_json::from_value(doc.clone()).ok()
    }
}

// =============================================================================
// Tests
// =============================================================================
