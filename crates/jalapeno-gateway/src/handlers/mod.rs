//! HTTP handlers, one module per resource.
//!
//! Each module exposes a `router()` building its sub-tree; [`api_router`]
//! merges them under the caller's `/api/v1` prefix. The health probe lives
//! outside the prefix and is mounted by the server directly.

pub mod collections;
pub mod graphs;
pub mod health;
pub mod instances;
pub mod paths;
pub mod rpo;
pub mod vpns;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Router;
use jalapeno_kernel::entity::Direction;

/// All `/api/v1` routes.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(instances::router())
        .merge(collections::router())
        .merge(graphs::router())
        .merge(paths::router())
        .merge(vpns::router())
        .merge(rpo::router())
}

/// Parse an optional `direction` query parameter, defaulting to outbound.
pub(crate) fn parse_direction(raw: Option<&str>) -> ApiResult<Direction> {
    match raw {
        None => Ok(Direction::Outbound),
        Some(s) => Direction::from_str_ci(s).ok_or_else(|| {
            ApiError::Validation("Direction must be 'outbound', 'inbound', or 'any'".to_string())
        }),
    }
}

/// Ensure a collection exists before querying it.
pub(crate) async fn require_collection(state: &AppState, name: &str) -> ApiResult<()> {
    if state.store.has_collection(name).await? {
        Ok(())
    } else {
        Err(ApiError::not_found_collection(name))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_defaults_to_outbound() {
        assert_eq!(parse_direction(None).unwrap(), Direction::Outbound);
        assert_eq!(parse_direction(Some("ANY")).unwrap(), Direction::Any);
        assert!(parse_direction(Some("sideways")).is_err());
    }
}
