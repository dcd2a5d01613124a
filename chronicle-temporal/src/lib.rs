//! # chronicle-temporal
//!
//! Read-only temporal query engine for the Chronicle knowledge store:
//! as-of snapshots, the recent-changes feed, discovery-lag analysis, and
//! one-hop context assembly. Composes reads over the storage pool; never
//! writes.

pub mod engine;
pub mod query;

pub use engine::QueryEngine;
