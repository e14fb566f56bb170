//! Graph store backends for the Jalapeno path-computation API.
//!
//! Two implementations of [`jalapeno_kernel::GraphStore`]:
//!
//! - [`arango::ArangoStore`] - the production backend, speaking the
//!   ArangoDB HTTP API (cursor, document, and collection endpoints) through
//!   a pooled [`reqwest`] client with basic auth, per-request timeouts, and
//!   bounded retry on transient read failures.
//! - [`memory::MemoryStore`] - an in-process store with real path search,
//!   used by the test suites and for local experimentation without a
//!   database.
//!
//! Database credentials load from `JALAPENO_*` environment variables via
//! [`config::DbSettings`].

pub mod arango;
pub mod config;
pub mod memory;

pub use arango::ArangoStore;
pub use config::DbSettings;
pub use memory::MemoryStore;
