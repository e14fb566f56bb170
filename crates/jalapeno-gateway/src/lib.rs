//! Jalapeno API gateway - read-oriented HTTP surface over a segment-routing
//! network graph.
//!
//! Turns the live multi-collection graph (routers, links, prefixes, L3VPN
//! objects, SRv6 SIDs) into actionable path computations: weighted shortest
//! paths, K-shortest alternates, country-aware routing, Flex-Algo
//! constrained searches, SRv6 uSID carriers, and metric-driven endpoint
//! selection (RPO).
//!
//! # Endpoint families
//!
//! | Prefix | Description |
//! |--------|-------------|
//! | `/health` | Liveness, outside the API prefix. |
//! | `/api/v1/instances`, `/api/v1/collections` | Collection inventory and opaque document access. |
//! | `/api/v1/graphs/{name}/...` | Vertex/edge/topology projections and the shortest-path family. |
//! | `/api/v1/vpns/{name}/...` | L3VPN prefix projections with service-SID synthesis. |
//! | `/api/v1/rpo/...` | Resource Path Optimization: pick the best endpoint, then route to it. |
//!
//! The graph store behind the handlers is abstract
//! ([`jalapeno_kernel::GraphStore`]); production wires in the ArangoDB
//! client from `jalapeno-graph`, the test suites an in-memory store.

pub mod engine;
pub mod error;
pub mod handlers;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use server::{ServerConfig, build_router, serve};
pub use state::AppState;
