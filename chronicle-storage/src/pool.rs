//! ConnectionPool — writer + read pool with round-robin selection.
//!
//! The only place in the workspace that holds `Mutex<Connection>`. All other
//! code accesses storage through `with_writer`/`with_reader` closures.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rusqlite::Connection;

use chronicle_core::errors::StorageError;
use chronicle_core::{ChronicleError, ChronicleResult};

use crate::pragmas;

/// Default number of reader connections.
pub const DEFAULT_READ_POOL_SIZE: usize = 2;

/// Connection pool for the knowledge store: 1 writer + N readers.
///
/// WAL mode is enabled on all connections, so readers never block on the
/// writer and never observe a half-committed transaction. Reader selection
/// is round-robin via an atomic counter.
pub struct ConnectionPool {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    read_index: AtomicUsize,
}

impl ConnectionPool {
    /// Open a file-backed pool: 1 read-write connection + `read_pool_size`
    /// read-only connections.
    pub fn open(path: &Path, read_pool_size: usize) -> ChronicleResult<Self> {
        let pool_size = if read_pool_size == 0 {
            DEFAULT_READ_POOL_SIZE
        } else {
            read_pool_size
        };

        let writer = Connection::open(path)
            .map_err(|e| sqlite_err(format!("open writer connection: {e}")))?;
        pragmas::configure_connection(&writer)?;

        let mut readers = Vec::with_capacity(pool_size);
        for i in 0..pool_size {
            let reader = Connection::open_with_flags(
                path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(|e| sqlite_err(format!("open reader connection {i}: {e}")))?;
            pragmas::configure_readonly_connection(&reader)?;
            readers.push(Mutex::new(reader));
        }

        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            read_index: AtomicUsize::new(0),
        })
    }

    /// Open an in-memory pool.
    ///
    /// SQLite in-memory databases are private to their connection, so the
    /// readers vector stays empty and `with_reader` falls back to the writer —
    /// every operation shares the single connection.
    pub fn open_in_memory() -> ChronicleResult<Self> {
        let writer = Connection::open_in_memory()
            .map_err(|e| sqlite_err(format!("open in-memory connection: {e}")))?;
        pragmas::configure_connection(&writer)?;

        Ok(Self {
            writer: Mutex::new(writer),
            readers: Vec::new(),
            read_index: AtomicUsize::new(0),
        })
    }

    /// Execute a closure with the writer connection.
    pub fn with_writer<F, T>(&self, f: F) -> ChronicleResult<T>
    where
        F: FnOnce(&Connection) -> ChronicleResult<T>,
    {
        let conn = self.writer.lock().map_err(|e| {
            ChronicleError::Storage(StorageError::PoolPoisoned {
                message: e.to_string(),
            })
        })?;
        f(&conn)
    }

    /// Execute a closure with a reader connection (round-robin).
    ///
    /// Falls back to the writer when no readers exist (in-memory mode).
    pub fn with_reader<F, T>(&self, f: F) -> ChronicleResult<T>
    where
        F: FnOnce(&Connection) -> ChronicleResult<T>,
    {
        if self.readers.is_empty() {
            return self.with_writer(f);
        }

        let index = self.read_index.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let conn = self.readers[index].lock().map_err(|e| {
            ChronicleError::Storage(StorageError::PoolPoisoned {
                message: e.to_string(),
            })
        })?;
        f(&conn)
    }

    /// Check WAL mode on the writer connection.
    pub fn is_wal_mode(&self) -> bool {
        self.with_writer(|conn| {
            let mode: String = conn
                .query_row("PRAGMA journal_mode", [], |row| row.get(0))
                .unwrap_or_default();
            Ok(mode.eq_ignore_ascii_case("wal"))
        })
        .unwrap_or(false)
    }
}

fn sqlite_err(message: String) -> ChronicleError {
    ChronicleError::Storage(StorageError::Sqlite { message })
}
