//! SRv6 micro-SID synthesis.
//!
//! Two synthesis paths live here:
//!
//! - [`synthesize_usid`] folds the ordered SIDs of a computed path into a
//!   single uSID carrier address, auto-detecting the uSID block from the
//!   first contributing SID when none is configured.
//! - [`service_sid`] combines an L3VPN locator SID with an MPLS
//!   label-derived function value into a per-prefix service SID. Inputs
//!   that do not follow the canonical grammar are rejected rather than
//!   rewritten.

use crate::algo;
use crate::entity::PathVertex;
use serde::{Deserialize, Serialize};
use std::net::Ipv6Addr;
use thiserror::Error;

/// Fallback uSID block when auto-detection finds nothing usable.
pub const DEFAULT_USID_BLOCK: &str = "fc00:0:";

/// The SRv6 block attached to every path-shaped response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Srv6Data {
    /// The SIDs that contributed to the carrier, in path order.
    pub srv6_sid_list: Vec<String>,
    /// The folded carrier address, empty when no SID matched.
    pub srv6_usid: String,
    /// The block the carrier was folded under.
    pub usid_block: String,
    /// The algorithm the SIDs were selected for.
    pub algo: u32,
}

/// Fold the ordered vertices of a path into a uSID carrier.
///
/// Per vertex, the first SID matching `algo` contributes; vertices without a
/// matching SID are skipped, so the carrier may encode fewer hops than the
/// path has. An empty selection yields an empty `srv6_usid` rather than an
/// error - callers treat it as a soft failure.
pub fn synthesize_usid(vertices: &[PathVertex], algo: u32, block: Option<&str>) -> Srv6Data {
    let locators: Vec<String> = vertices
        .iter()
        .filter_map(|vertex| {
            let sids = vertex.sids.as_deref()?;
            algo::first_matching_sid(sids, algo)?.srv6_sid.clone()
        })
        .collect();

    let usid_block = block
        .map(str::to_string)
        .or_else(|| locators.first().and_then(|sid| detect_block(sid)))
        .unwrap_or_else(|| DEFAULT_USID_BLOCK.to_string());

    if locators.is_empty() {
        return Srv6Data {
            srv6_sid_list: Vec::new(),
            srv6_usid: String::new(),
            usid_block,
            algo,
        };
    }

    // Strip the block, then keep the first 16-bit group of the remainder:
    // that group is the vertex's µSID slot. SIDs outside the block cannot
    // contribute a slot and are dropped from the carrier.
    let slots: Vec<&str> = locators
        .iter()
        .filter_map(|sid| {
            let remainder = sid.strip_prefix(usid_block.as_str())?;
            remainder.split(':').next()
        })
        .filter(|slot| !slot.is_empty())
        .collect();

    // No SID inside the block means no carrier; a bare block with an
    // appended "::" would not be a valid address.
    let srv6_usid = if slots.is_empty() {
        String::new()
    } else {
        format!("{}{}::", usid_block, slots.join(":"))
    };

    Srv6Data {
        srv6_sid_list: locators,
        srv6_usid,
        usid_block,
        algo,
    }
}

/// The uSID block of an SRv6 address: everything up to and including the
/// second `:` separator. Addresses with fewer than three groups carry no
/// detectable block.
fn detect_block(sid: &str) -> Option<String> {
    let mut parts = sid.split(':');
    let first = parts.next()?;
    let second = parts.next()?;
    parts.next()?;
    Some(format!("{first}:{second}:"))
}

// ─────────────────────────────────────────────────────────────────────────────
// L3VPN service SIDs
// ─────────────────────────────────────────────────────────────────────────────

/// Rejection reasons for L3VPN service-SID synthesis.
#[derive(Debug, Error, PartialEq)]
pub enum VpnSidError {
    #[error("locator SID '{0}' must end in ':' or '::'")]
    MissingTrailingColon(String),
    #[error("'{0}' is not a valid SRv6 service SID")]
    InvalidAddress(String),
}

/// µSID function value derived from an MPLS service label: lowercase hex
/// with trailing zeros stripped, padded back to at least four digits.
pub fn label_function(label: u64) -> String {
    let hex = format!("{label:x}");
    let trimmed = hex.trim_end_matches('0');
    let function = if trimmed.is_empty() { "0" } else { trimmed };
    if function.len() >= 4 {
        function.to_string()
    } else {
        format!("{function:0>4}")
    }
}

/// Combine a locator SID with a label function into a service SID.
///
/// The locator must be an IPv6 textual form ending in `:` or `::`; the
/// result must itself parse as an IPv6 address. Anything else is rejected.
pub fn service_sid(locator: &str, function: &str) -> Result<String, VpnSidError> {
    let base = if let Some(base) = locator.strip_suffix("::") {
        base
    } else if let Some(base) = locator.strip_suffix(':') {
        base
    } else {
        return Err(VpnSidError::MissingTrailingColon(locator.to_string()));
    };

    let candidate = format!("{base}:{function}::");
    if candidate.parse::<Ipv6Addr>().is_err() {
        return Err(VpnSidError::InvalidAddress(candidate));
    }
    Ok(candidate)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EndpointBehavior, SidRecord};

    fn vertex(key: &str, sids: &[(&str, u32)]) -> PathVertex {
        PathVertex {
            id: format!("igp_node/{key}"),
            key: key.to_string(),
            sids: Some(
                sids.iter()
                    .map(|(address, algo)| SidRecord {
                        srv6_sid: Some(address.to_string()),
                        srv6_endpoint_behavior: Some(EndpointBehavior {
                            algo: *algo,
                            endpoint_behavior: Some(48),
                            flag: Some(0),
                        }),
                    })
                    .collect(),
            ),
            ..Default::default()
        }
    }

    #[test]
    fn folds_a_three_hop_carrier() {
        let path = [
            vertex("r1", &[("fc00:0:1::", 0)]),
            vertex("r2", &[("fc00:0:2::", 0)]),
            vertex("r3", &[("fc00:0:3::", 0)]),
        ];
        let data = synthesize_usid(&path, 0, None);
        assert_eq!(data.usid_block, "fc00:0:");
        assert_eq!(data.srv6_usid, "fc00:0:1:2:3::");
        assert_eq!(data.srv6_sid_list.len(), 3);
        assert_eq!(data.algo, 0);
        assert!(data.srv6_usid.parse::<std::net::Ipv6Addr>().is_ok());
    }

    #[test]
    fn block_detection_follows_the_first_selected_sid() {
        let path = [
            vertex("r1", &[("fbbb:0:100::", 0)]),
            vertex("r2", &[("fbbb:0:200::", 0)]),
        ];
        let data = synthesize_usid(&path, 0, None);
        assert_eq!(data.usid_block, "fbbb:0:");
        assert_eq!(data.srv6_usid, "fbbb:0:100:200::");
    }

    #[test]
    fn explicit_block_wins_over_detection() {
        let path = [vertex("r1", &[("fc00:2:1::", 128)])];
        let data = synthesize_usid(&path, 128, Some("fc00:2:"));
        assert_eq!(data.usid_block, "fc00:2:");
        assert_eq!(data.srv6_usid, "fc00:2:1::");
    }

    #[test]
    fn algo_filter_selects_per_vertex() {
        let path = [
            vertex("r1", &[("fc00:0:1::", 0), ("fc00:2:1::", 128)]),
            vertex("r2", &[("fc00:0:2::", 0), ("fc00:2:2::", 128)]),
        ];
        let data = synthesize_usid(&path, 128, None);
        assert_eq!(data.usid_block, "fc00:2:");
        assert_eq!(data.srv6_usid, "fc00:2:1:2::");
        assert_eq!(data.srv6_sid_list, vec!["fc00:2:1::", "fc00:2:2::"]);
    }

    #[test]
    fn vertices_without_matching_sids_are_skipped() {
        let path = [
            vertex("r1", &[("fc00:0:1::", 0)]),
            PathVertex {
                id: "igp_node/r2".into(),
                key: "r2".into(),
                ..Default::default()
            },
            vertex("r3", &[("fc00:0:3::", 0)]),
        ];
        let data = synthesize_usid(&path, 0, None);
        assert_eq!(data.srv6_sid_list.len(), 2);
        assert_eq!(data.srv6_usid, "fc00:0:1:3::");
    }

    #[test]
    fn empty_selection_is_a_soft_failure() {
        let data = synthesize_usid(&[], 0, None);
        assert!(data.srv6_sid_list.is_empty());
        assert_eq!(data.srv6_usid, "");
        assert_eq!(data.usid_block, DEFAULT_USID_BLOCK);
    }

    #[test]
    fn short_address_falls_back_to_default_block() {
        let path = [vertex("r1", &[("fc00::", 0)])];
        let data = synthesize_usid(&path, 0, None);
        assert_eq!(data.usid_block, DEFAULT_USID_BLOCK);
    }

    #[test]
    fn single_vertex_path_yields_a_single_slot() {
        let path = [vertex("r1", &[("fc00:0:1::", 0)])];
        let data = synthesize_usid(&path, 0, None);
        assert_eq!(data.srv6_usid, "fc00:0:1::");
    }

    #[test]
    fn folding_is_pure() {
        let path = [
            vertex("r1", &[("fc00:0:1::", 0)]),
            vertex("r2", &[("fc00:0:2::", 0)]),
        ];
        let first = synthesize_usid(&path, 0, None);
        let second = synthesize_usid(&path, 0, None);
        assert_eq!(first, second);
    }

    // ──── service SIDs ────

    #[test]
    fn label_function_strips_trailing_zeros_and_pads() {
        assert_eq!(label_function(0x1000), "0001");
        assert_eq!(label_function(0xfe000), "00fe");
        assert_eq!(label_function(0), "0000");
        assert_eq!(label_function(0x12345), "12345");
    }

    #[test]
    fn service_sid_accepts_canonical_locators() {
        assert_eq!(
            service_sid("fc00:0:200::", "0001").unwrap(),
            "fc00:0:200:0001::"
        );
        assert_eq!(
            service_sid("fc00:0:200:", "0001").unwrap(),
            "fc00:0:200:0001::"
        );
    }

    #[test]
    fn service_sid_rejects_malformed_input() {
        assert_eq!(
            service_sid("fc00:0:200", "0001"),
            Err(VpnSidError::MissingTrailingColon("fc00:0:200".into()))
        );
        assert!(matches!(
            service_sid("not-an-address::", "0001"),
            Err(VpnSidError::InvalidAddress(_))
        ));
    }
}
