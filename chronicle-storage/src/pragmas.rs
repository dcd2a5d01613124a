//! SQLite PRAGMA configuration.
//!
//! Must be called on every connection immediately after opening.

use rusqlite::Connection;

use chronicle_core::ChronicleResult;

use crate::to_storage_err;

/// Configure a read-write SQLite connection:
/// - WAL for concurrent readers during writes
/// - busy_timeout for lock contention (primary concurrency mechanism)
/// - mmap for faster reads on large tables
/// - NORMAL synchronous for the WAL durability trade-off
pub fn configure_connection(conn: &Connection) -> ChronicleResult<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        PRAGMA cache_size = -8000;
        PRAGMA mmap_size = 268435456;
        PRAGMA temp_store = MEMORY;
        ",
    )
    .map_err(|e| to_storage_err(format!("apply pragmas: {e}")))?;
    Ok(())
}

/// Configure a read-only connection. Same PRAGMAs plus `query_only = ON` to
/// prevent accidental writes through reader connections.
pub fn configure_readonly_connection(conn: &Connection) -> ChronicleResult<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        PRAGMA cache_size = -8000;
        PRAGMA mmap_size = 268435456;
        PRAGMA temp_store = MEMORY;
        PRAGMA query_only = ON;
        ",
    )
    .map_err(|e| to_storage_err(format!("apply readonly pragmas: {e}")))?;
    Ok(())
}
