//! RelationshipStore — write/read surface for directed typed edges.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use chronicle_core::models::{AsOf, Direction, Entity, Relationship};
use chronicle_core::{ChronicleError, ChronicleResult};

use crate::pool::ConnectionPool;
use crate::queries::{entity_ops, relationship_ops};
use crate::with_immediate_tx;

pub struct RelationshipStore {
    pool: Arc<ConnectionPool>,
}

impl RelationshipStore {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Create an open edge between two existing entity versions.
    ///
    /// Both endpoint ids are validated inside the insert transaction; a
    /// missing endpoint fails with `VersionNotFound` and nothing is written.
    pub fn link(
        &self,
        rel_type: &str,
        source_id: &str,
        target_id: &str,
        valid_from: Option<DateTime<Utc>>,
        tx_from: DateTime<Utc>,
        properties: Map<String, Value>,
    ) -> ChronicleResult<Relationship> {
        let rel = self.pool.with_writer(|conn| {
            with_immediate_tx(conn, |c| {
                for id in [source_id, target_id] {
                    if entity_ops::get_entity(c, id)?.is_none() {
                        return Err(ChronicleError::VersionNotFound { id: id.to_string() });
                    }
                }

                let rel = Relationship {
                    id: Relationship::generate_id(),
                    rel_type: rel_type.to_string(),
                    source_id: source_id.to_string(),
                    target_id: target_id.to_string(),
                    valid_from,
                    valid_to: None,
                    tx_from,
                    tx_to: None,
                    properties,
                };
                relationship_ops::insert_relationship(c, &rel)?;
                Ok(rel)
            })
        })?;

        debug!(rel_type = %rel_type, id = %rel.id, "linked entities");
        Ok(rel)
    }

    /// Close an edge's transaction interval.
    ///
    /// Idempotent for an already-closed edge (no-op). An id that has never
    /// existed is a caller bug and fails with `RelationshipNotFound`.
    pub fn unlink(&self, relationship_id: &str, at_tx_time: DateTime<Utc>) -> ChronicleResult<()> {
        self.pool.with_writer(|conn| {
            let closed = relationship_ops::close_relationship(conn, relationship_id, at_tx_time)?;
            if closed == 0
                && relationship_ops::get_relationship(conn, relationship_id)?.is_none()
            {
                return Err(ChronicleError::RelationshipNotFound {
                    id: relationship_id.to_string(),
                });
            }
            Ok(())
        })
    }

    /// Point lookup by edge id.
    pub fn get_by_id(&self, id: &str) -> ChronicleResult<Option<Relationship>> {
        self.pool
            .with_reader(|conn| relationship_ops::get_relationship(conn, id))
    }

    /// One-hop traversal from `entity_id`: covering edges paired with the
    /// opposite endpoint as believed at the same instant. Ordered by
    /// `(tx_from, id)`.
    pub fn neighbors(
        &self,
        entity_id: &str,
        direction: Direction,
        as_of: AsOf,
    ) -> ChronicleResult<Vec<(Relationship, Entity)>> {
        self.pool
            .with_reader(|conn| relationship_ops::neighbors_at(conn, entity_id, direction, as_of))
    }
}
