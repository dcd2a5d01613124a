//! EntityStore — write/read surface for versioned entity facts.
//!
//! Enforces the single-current-version invariant: every write path runs in a
//! `BEGIN IMMEDIATE` transaction, and the partial UNIQUE index from v002
//! backstops the application-level checks.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use chronicle_core::models::{Entity, NewEntity};
use chronicle_core::{ChronicleError, ChronicleResult};

use crate::pool::ConnectionPool;
use crate::queries::entity_ops;
use crate::with_immediate_tx;

pub struct EntityStore {
    pool: Arc<ConnectionPool>,
}

impl EntityStore {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Create the first current version for an entity key.
    ///
    /// Fails with `Conflict` when an open version already exists — new
    /// information about a known key goes through [`supersede`](Self::supersede)
    /// instead, never through a second insert.
    pub fn insert(&self, new: NewEntity) -> ChronicleResult<Entity> {
        check_valid_interval(new.valid_from, new.valid_to)?;

        let entity = Entity {
            id: Entity::generate_id(&new.entity_type),
            entity_type: new.entity_type,
            entity_key: new.entity_key,
            valid_from: new.valid_from,
            valid_to: new.valid_to,
            tx_from: new.tx_from,
            tx_to: None,
            data: new.data,
        };

        self.pool.with_writer(|conn| {
            with_immediate_tx(conn, |c| {
                if entity_ops::get_open_version(c, &entity.entity_key)?.is_some() {
                    return Err(ChronicleError::Conflict {
                        entity_key: entity.entity_key.clone(),
                        reason: "an open version already exists; use supersede".into(),
                    });
                }
                entity_ops::insert_entity(c, &entity)
            })
        })?;

        debug!(entity_key = %entity.entity_key, id = %entity.id, "inserted entity version");
        Ok(entity)
    }

    /// Replace the current version for `entity_key` with a new one.
    ///
    /// Atomically closes the open row's `tx_to` at `at_tx_time` and inserts
    /// the new row with `tx_from = at_tx_time`. A crash or error between the
    /// two steps rolls back to the prior state — never zero or two open
    /// versions. The new valid interval may overlap the previous version's
    /// (retroactive correction); valid time is caller-asserted.
    pub fn supersede(
        &self,
        entity_key: &str,
        new_valid_from: Option<DateTime<Utc>>,
        new_valid_to: Option<DateTime<Utc>>,
        new_data: Map<String, Value>,
        at_tx_time: DateTime<Utc>,
    ) -> ChronicleResult<Entity> {
        check_valid_interval(new_valid_from, new_valid_to)?;

        let entity = self.pool.with_writer(|conn| {
            with_immediate_tx(conn, |c| {
                let current = entity_ops::get_open_version(c, entity_key)?.ok_or_else(|| {
                    ChronicleError::EntityNotFound {
                        key: entity_key.to_string(),
                    }
                })?;

                if at_tx_time < current.tx_from {
                    return Err(ChronicleError::InvalidTime {
                        reason: format!(
                            "supersession at {at_tx_time} precedes open version tx_from {}",
                            current.tx_from
                        ),
                    });
                }

                let closed = entity_ops::close_version(c, &current.id, at_tx_time)?;
                if closed == 0 {
                    return Err(ChronicleError::Conflict {
                        entity_key: entity_key.to_string(),
                        reason: "open version was closed by a concurrent supersede".into(),
                    });
                }

                let entity = Entity {
                    id: Entity::generate_id(&current.entity_type),
                    entity_type: current.entity_type,
                    entity_key: entity_key.to_string(),
                    valid_from: new_valid_from,
                    valid_to: new_valid_to,
                    tx_from: at_tx_time,
                    tx_to: None,
                    data: new_data,
                };
                entity_ops::insert_entity(c, &entity)?;
                Ok(entity)
            })
        })?;

        debug!(
            entity_key = %entity_key,
            new_id = %entity.id,
            at = %at_tx_time,
            "superseded entity version"
        );
        Ok(entity)
    }

    /// The current (open) version for a key. `Ok(None)` means "nothing known".
    pub fn get_current(&self, entity_key: &str) -> ChronicleResult<Option<Entity>> {
        self.pool
            .with_reader(|conn| entity_ops::get_open_version(conn, entity_key))
    }

    /// The version believed at `tx_time` (`[tx_from, tx_to)`, open = +inf).
    pub fn get_as_of(
        &self,
        entity_key: &str,
        tx_time: DateTime<Utc>,
    ) -> ChronicleResult<Option<Entity>> {
        self.pool
            .with_reader(|conn| entity_ops::get_version_as_of(conn, entity_key, tx_time))
    }

    /// Exact version lookup by row id.
    pub fn get_by_id(&self, id: &str) -> ChronicleResult<Option<Entity>> {
        self.pool.with_reader(|conn| entity_ops::get_entity(conn, id))
    }
}

fn check_valid_interval(
    valid_from: Option<DateTime<Utc>>,
    valid_to: Option<DateTime<Utc>>,
) -> ChronicleResult<()> {
    if let (Some(from), Some(to)) = (valid_from, valid_to) {
        if from > to {
            return Err(ChronicleError::InvalidTime {
                reason: format!("valid_from {from} is after valid_to {to}"),
            });
        }
    }
    Ok(())
}
