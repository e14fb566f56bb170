//! Shared application state.

use jalapeno_kernel::GraphStore;
use std::sync::Arc;

/// State shared across all request handlers. The store is process-wide and
/// initialized once at startup; requests only ever read it.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn GraphStore>,
    /// Reported by the health endpoint.
    pub database_server: String,
    pub database_name: String,
}

impl AppState {
    pub fn new(store: Arc<dyn GraphStore>, database_server: &str, database_name: &str) -> Self {
        AppState {
            store,
            database_server: database_server.to_string(),
            database_name: database_name.to_string(),
        }
    }
}
