//! Store — opens the pool, runs migrations, hands out the two stores.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use chronicle_core::config::ChronicleConfig;
use chronicle_core::ChronicleResult;

use crate::entity_store::EntityStore;
use crate::migrations;
use crate::pool::{ConnectionPool, DEFAULT_READ_POOL_SIZE};
use crate::relationship_store::RelationshipStore;

/// An opened knowledge store: shared connection pool plus the entity and
/// relationship write/read surfaces. Read-only query engines take the pool
/// via [`Store::pool`].
pub struct Store {
    pool: Arc<ConnectionPool>,
    entities: EntityStore,
    relationships: RelationshipStore,
}

impl Store {
    /// Open a file-backed store and run any pending migrations.
    pub fn open(path: &Path) -> ChronicleResult<Self> {
        let store = Self::from_pool(ConnectionPool::open(path, DEFAULT_READ_POOL_SIZE)?)?;
        info!(path = %path.display(), "opened chronicle store");
        Ok(store)
    }

    /// Open an in-memory store (tests, tooling).
    pub fn open_in_memory() -> ChronicleResult<Self> {
        Self::from_pool(ConnectionPool::open_in_memory()?)
    }

    /// Open according to configuration: a file path when set, in-memory otherwise.
    pub fn open_with_config(config: &ChronicleConfig) -> ChronicleResult<Self> {
        match &config.storage.db_path {
            Some(path) => {
                let pool = ConnectionPool::open(path, config.storage.read_pool_size)?;
                let store = Self::from_pool(pool)?;
                info!(path = %path.display(), "opened chronicle store");
                Ok(store)
            }
            None => Self::open_in_memory(),
        }
    }

    fn from_pool(pool: ConnectionPool) -> ChronicleResult<Self> {
        let pool = Arc::new(pool);
        pool.with_writer(|conn| migrations::run_migrations(conn))?;
        Ok(Self {
            entities: EntityStore::new(pool.clone()),
            relationships: RelationshipStore::new(pool.clone()),
            pool,
        })
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    pub fn relationships(&self) -> &RelationshipStore {
        &self.relationships
    }

    /// Shared pool handle for read-only engines.
    pub fn pool(&self) -> Arc<ConnectionPool> {
        self.pool.clone()
    }
}
