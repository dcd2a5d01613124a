//! Query parameter and result types for the temporal read surface.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, Relationship};

/// The transaction-time instant a read should reflect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AsOf {
    /// The current belief (open transaction interval).
    Current,
    /// The belief as it stood at a past transaction instant.
    At(DateTime<Utc>),
}

/// Direction for one-hop relationship traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Follow edges where the entity is the source.
    Outgoing,
    /// Follow edges where the entity is the target.
    Incoming,
    /// Both of the above.
    Both,
}

/// Half-open window `[from, to)` over transaction-start times.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TxWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TxWindow {
    pub fn contains(&self, tx_time: DateTime<Utc>) -> bool {
        self.from <= tx_time && tx_time < self.to
    }
}

/// One late-discovered entity with its computed lag.
#[derive(Debug, Clone, PartialEq)]
pub struct LagEntry {
    pub entity: Entity,
    /// `tx_from - valid_from` for the current version.
    pub lag: Duration,
}

/// Aggregate discovery-lag statistics over a transaction-time window.
///
/// Percentiles use the deterministic rank method: the p-th percentile is the
/// value at rank `ceil(p/100 * n)` (1-indexed) in the ascending-sorted lags.
#[derive(Debug, Clone, PartialEq)]
pub struct LagStats {
    pub count: usize,
    pub mean: Duration,
    pub p50: Duration,
    pub p95: Duration,
    pub max: Duration,
}

impl LagStats {
    /// Stats over an empty sample: zero everywhere.
    pub fn empty() -> Self {
        Self {
            count: 0,
            mean: Duration::zero(),
            p50: Duration::zero(),
            p95: Duration::zero(),
            max: Duration::zero(),
        }
    }
}

/// An entity with its one-hop neighborhood at a single consistent instant.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityContext {
    pub entity: Entity,
    /// Edges where `entity` is the source, paired with the target entity.
    pub outgoing: Vec<(Relationship, Entity)>,
    /// Edges where `entity` is the target, paired with the source entity.
    pub incoming: Vec<(Relationship, Entity)>,
}

impl EntityContext {
    pub fn neighbor_count(&self) -> usize {
        self.outgoing.len() + self.incoming.len()
    }
}

/// Current-belief counts, grouped by type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StoreStats {
    pub total_entities: u64,
    pub entities_by_type: BTreeMap<String, u64>,
    pub total_relationships: u64,
    pub relationships_by_type: BTreeMap<String, u64>,
}
