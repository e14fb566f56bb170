//! Jalapeno kernel - the dependency-free core of the path-computation API.
//!
//! This crate carries everything the service layers share without doing any
//! I/O of its own:
//!
//! - [`entity`] - typed projections of graph documents (vertices, edges,
//!   SID records) and the direction / weight enumerations.
//! - [`algo`] - the SR Flex-Algorithm participation predicate.
//! - [`srv6`] - the micro-SID (uSID) carrier synthesizer and the L3VPN
//!   service-SID synthesis grammar.
//! - [`metric`] - the Resource Path Optimization metric catalogue and the
//!   pure endpoint-selection routine.
//! - [`store`] - the [`GraphStore`](store::GraphStore) trait: the contract
//!   every graph backend implements, with typed query specs and records so
//!   callers never see the backend's query language.
//!
//! Concrete backends (ArangoDB over HTTP, the in-memory store used by the
//! test suite) live in `jalapeno-graph`; the HTTP surface lives in
//! `jalapeno-gateway`.

pub mod algo;
pub mod entity;
pub mod metric;
pub mod srv6;
pub mod store;

pub use entity::{CollectionKind, CollectionMeta, Direction, DocumentId, WeightAttribute};
pub use srv6::Srv6Data;
pub use store::{GraphStore, StoreError};
