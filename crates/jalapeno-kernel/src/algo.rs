//! SR Flex-Algorithm participation.
//!
//! A vertex participates in algorithm `a` when at least one of its SID
//! records carries `srv6_endpoint_behavior.algo == a`. Algorithm 0 is the
//! base topology: every vertex participates, regardless of its SID set.
//! SID *selection* is stricter than participation - it always matches the
//! requested algorithm exactly, so an algo-0 request still picks algo-0 SIDs.

use crate::entity::SidRecord;
use serde_json::Value;

/// Collection-name fragment identifying IGP-kind vertices. Only these are
/// subject to the participation constraint during path filtering.
pub const IGP_NODE_FRAGMENT: &str = "igp_node";

/// Whether a vertex id refers to an IGP-kind vertex.
pub fn is_igp_vertex(vertex_id: &str) -> bool {
    vertex_id.contains(IGP_NODE_FRAGMENT)
}

/// Whether a SID record matches algorithm `algo`.
pub fn sid_matches(sid: &SidRecord, algo: u32) -> bool {
    sid.srv6_endpoint_behavior
        .as_ref()
        .is_some_and(|behavior| behavior.algo == algo)
}

/// First SID of `sids` matching `algo`, in the vertex's own ordering.
pub fn first_matching_sid(sids: &[SidRecord], algo: u32) -> Option<&SidRecord> {
    sids.iter().find(|sid| sid_matches(sid, algo))
}

/// Participation predicate over a typed SID set.
///
/// Algorithm 0 short-circuits to `true`: the base topology includes every
/// vertex, with or without SIDs.
pub fn participates(sids: Option<&[SidRecord]>, algo: u32) -> bool {
    if algo == 0 {
        return true;
    }
    sids.is_some_and(|sids| first_matching_sid(sids, algo).is_some())
}

/// Participation predicate over a raw graph document.
pub fn document_participates(doc: &Value, algo: u32) -> bool {
    if algo == 0 {
        return true;
    }
    document_sids(doc)
        .map(|sids| participates(Some(&sids), algo))
        .unwrap_or(false)
}

/// Typed view of a raw document's `sids` array, if present and well formed.
pub fn document_sids(doc: &Value) -> Option<Vec<SidRecord>> {
    let sids = doc.get("sids")?;
    serde_json::from_value(sids.clone()).ok()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EndpointBehavior;
    use serde_json::json;

    fn sid(address: &str, algo: u32) -> SidRecord {
        SidRecord {
            srv6_sid: Some(address.to_string()),
            srv6_endpoint_behavior: Some(EndpointBehavior {
                algo,
                endpoint_behavior: Some(48),
                flag: Some(0),
            }),
        }
    }

    #[test]
    fn algo_zero_is_unconditional() {
        assert!(participates(None, 0));
        assert!(participates(Some(&[]), 0));
        assert!(participates(Some(&[sid("fc00:0:1::", 128)]), 0));
    }

    #[test]
    fn nonzero_algo_requires_a_matching_sid() {
        let sids = [sid("fc00:0:1::", 0), sid("fc00:2:1::", 128)];
        assert!(participates(Some(&sids), 128));
        assert!(!participates(Some(&sids), 129));
        assert!(!participates(None, 128));
    }

    #[test]
    fn selection_matches_the_requested_algo_exactly() {
        let sids = [sid("fc00:0:1::", 0), sid("fc00:2:1::", 128)];
        let selected = first_matching_sid(&sids, 128).unwrap();
        assert_eq!(selected.srv6_sid.as_deref(), Some("fc00:2:1::"));
        // algo 0 selection still needs an algo-0 record
        let selected = first_matching_sid(&sids, 0).unwrap();
        assert_eq!(selected.srv6_sid.as_deref(), Some("fc00:0:1::"));
        assert!(first_matching_sid(&[sid("fc00:2:1::", 128)], 0).is_none());
    }

    #[test]
    fn sid_without_behavior_never_matches() {
        let bare = SidRecord {
            srv6_sid: Some("fc00:0:9::".into()),
            srv6_endpoint_behavior: None,
        };
        assert!(!sid_matches(&bare, 0));
        assert!(!sid_matches(&bare, 128));
    }

    #[test]
    fn document_predicate_tolerates_malformed_sid_arrays() {
        let doc = json!({"_id": "igp_node/r1", "sids": "not-an-array"});
        assert!(!document_participates(&doc, 128));
        assert!(document_participates(&doc, 0));
    }

    #[test]
    fn igp_vertex_detection() {
        assert!(is_igp_vertex("igp_node/r1"));
        assert!(!is_igp_vertex("hosts/server-1"));
    }
}
