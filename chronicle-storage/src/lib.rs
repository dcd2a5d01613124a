//! # chronicle-storage
//!
//! SQLite persistence layer for the Chronicle bi-temporal knowledge store.
//! Single write connection + read pool (WAL mode). The `queries` modules are
//! the only code that touches the schema; `EntityStore` and
//! `RelationshipStore` are the public write/read surfaces.

pub mod entity_store;
pub mod migrations;
pub mod pool;
pub mod pragmas;
pub mod queries;
pub mod relationship_store;
pub mod store;

pub use entity_store::EntityStore;
pub use relationship_store::RelationshipStore;
pub use store::Store;

use rusqlite::Connection;

use chronicle_core::errors::StorageError;
use chronicle_core::{ChronicleError, ChronicleResult};

/// Helper to convert a string message into a `ChronicleError::Storage`.
pub fn to_storage_err(msg: String) -> ChronicleError {
    ChronicleError::Storage(StorageError::Sqlite { message: msg })
}

/// Run `f` inside a `BEGIN IMMEDIATE` transaction, rolling back on error.
///
/// IMMEDIATE takes the write lock up front so concurrent writers serialize at
/// the SQLite level; a failure mid-closure leaves the prior state intact.
pub(crate) fn with_immediate_tx<T>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> ChronicleResult<T>,
) -> ChronicleResult<T> {
    conn.execute_batch("BEGIN IMMEDIATE")
        .map_err(|e| to_storage_err(format!("begin transaction: {e}")))?;

    match f(conn) {
        Ok(value) => {
            conn.execute_batch("COMMIT")
                .map_err(|e| to_storage_err(format!("commit: {e}")))?;
            Ok(value)
        }
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(e)
        }
    }
}
