/// Persistence-layer errors. Always surfaced, never silently retried.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("sqlite error: {message}")]
    Sqlite { message: String },

    #[error("migration v{version:03} failed: {reason}")]
    MigrationFailed { version: u32, reason: String },

    #[error("connection pool lock poisoned: {message}")]
    PoolPoisoned { message: String },
}
