//! # chronicle-core
//!
//! Shared types for the Chronicle bi-temporal knowledge store:
//! row models, error taxonomy, and configuration. No I/O lives here.

pub mod config;
pub mod errors;
pub mod models;

pub use errors::{ChronicleError, ChronicleResult};
