//! QueryEngine — thin orchestrator over the query modules.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use chronicle_core::models::{AsOf, Entity, EntityContext, LagEntry, LagStats, StoreStats, TxWindow};
use chronicle_core::ChronicleResult;
use chronicle_storage::pool::ConnectionPool;
use chronicle_storage::queries::temporal_ops;

use crate::query;

/// The temporal read surface.
///
/// Holds the shared connection pool and runs every query on a reader
/// connection; WAL mode guarantees readers never see a half-applied
/// supersession.
pub struct QueryEngine {
    pool: Arc<ConnectionPool>,
}

impl QueryEngine {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Everything the store believed at `tx_time` — "what did we know at T?".
    /// Unknown types or empty stores yield an empty list, not an error.
    pub fn as_of_snapshot(
        &self,
        tx_time: DateTime<Utc>,
        entity_type: Option<&str>,
    ) -> ChronicleResult<Vec<Entity>> {
        self.pool
            .with_reader(|conn| temporal_ops::snapshot_at(conn, tx_time, entity_type))
    }

    /// Every version learned since `since_tx_time`, oldest first — the
    /// change feed ("what changed in the last N hours?").
    pub fn recent_changes(
        &self,
        since_tx_time: DateTime<Utc>,
        entity_type: Option<&str>,
    ) -> ChronicleResult<Vec<Entity>> {
        self.pool
            .with_reader(|conn| temporal_ops::changes_since(conn, since_tx_time, entity_type))
    }

    /// Current-belief rows whose valid interval covers `valid_time` —
    /// "what was true at T?" on the real-world axis.
    pub fn valid_at(
        &self,
        valid_time: DateTime<Utc>,
        entity_type: Option<&str>,
    ) -> ChronicleResult<Vec<Entity>> {
        self.pool
            .with_reader(|conn| temporal_ops::valid_at(conn, valid_time, entity_type))
    }

    /// Current versions of `entity_type` discovered at least `min_lag` after
    /// they became true, worst first. Rows with unknown `valid_from` are
    /// excluded, not treated as zero lag.
    pub fn discovery_lag(
        &self,
        entity_type: &str,
        min_lag: Duration,
    ) -> ChronicleResult<Vec<LagEntry>> {
        self.pool
            .with_reader(|conn| query::lag::discovery_lag(conn, entity_type, min_lag))
    }

    /// Aggregate lag statistics over current versions whose `tx_from` falls
    /// inside `window`. Percentiles use the deterministic rank method.
    pub fn aggregate_lag(&self, entity_type: &str, window: TxWindow) -> ChronicleResult<LagStats> {
        self.pool
            .with_reader(|conn| query::lag::aggregate_lag(conn, entity_type, window))
    }

    /// An entity plus its one-hop neighborhood, all at the same instant.
    /// `Ok(None)` when the key had no believed version then — nothing known.
    pub fn entity_context(
        &self,
        entity_key: &str,
        as_of: AsOf,
    ) -> ChronicleResult<Option<EntityContext>> {
        self.pool
            .with_reader(|conn| query::context::entity_context(conn, entity_key, as_of))
    }

    /// Current entity/relationship counts grouped by type.
    pub fn stats(&self) -> ChronicleResult<StoreStats> {
        self.pool.with_reader(query::stats::store_stats)
    }
}
