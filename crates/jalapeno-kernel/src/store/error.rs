//! Graph store error taxonomy.

use thiserror::Error;

/// Failure modes a [`GraphStore`](super::GraphStore) implementation may
/// surface. `Unavailable` is transient - callers may retry reads;
/// `Rejected` means the query itself is broken and retrying cannot help.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend is unreachable, timed out, or refused our credentials.
    #[error("graph backend unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected the query (compilation, bind mismatch).
    #[error("graph query rejected: {0}")]
    Rejected(String),

    /// The named collection does not exist.
    #[error("collection {0} not found")]
    UnknownCollection(String),

    /// The collection name fails the allow-grammar and was never sent.
    #[error("invalid collection name: {0}")]
    InvalidCollection(String),
}

impl StoreError {
    /// Whether a read may be retried after backing off.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}
