//! Gateway error types.
//!
//! Every handler failure maps to one of the kinds below; the HTTP body is
//! always `{"detail": "..."}` with a human-readable message and never a
//! stack trace. A path search that finds nothing is *not* an error - those
//! return `200` with `found: false` so downstream controllers can branch
//! on it.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use jalapeno_kernel::StoreError;
use serde_json::json;
use thiserror::Error;

/// Gateway-level errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed parameter, unknown enum value, missing required field.
    #[error("{0}")]
    Validation(String),

    /// Collection, vertex, or endpoint absent.
    #[error("{0}")]
    NotFound(String),

    /// Graph store unreachable or credentials refused; transient.
    #[error("could not reach graph database: {0}")]
    BackendUnavailable(String),

    /// The graph store rejected a query; not retryable.
    #[error("graph database error: {0}")]
    Backend(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found_collection(name: &str) -> Self {
        ApiError::NotFound(format!("Collection {name} not found"))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => ApiError::BackendUnavailable(msg),
            StoreError::Rejected(msg) => ApiError::Backend(msg),
            StoreError::UnknownCollection(name) => ApiError::not_found_collection(&name),
            StoreError::InvalidCollection(name) => {
                ApiError::Validation(format!("invalid collection name: {name}"))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Backend(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_the_spec_kinds() {
        assert!(matches!(
            ApiError::from(StoreError::Unavailable("refused".into())),
            ApiError::BackendUnavailable(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::Rejected("bind mismatch".into())),
            ApiError::Backend(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::UnknownCollection("ipv6_graph".into())),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::InvalidCollection("x;".into())),
            ApiError::Validation(_)
        ));
    }
}
