use super::StorageError;

/// Top-level error type for the Chronicle store.
/// Subsystem errors convert into this via `From` impls.
///
/// "Nothing known" is never an error: lookups that may legitimately find
/// nothing return `Option`/empty collections, and these variants mark
/// invalid references or violated write invariants instead.
#[derive(Debug, thiserror::Error)]
pub enum ChronicleError {
    #[error("no current version for entity key: {key}")]
    EntityNotFound { key: String },

    #[error("entity version not found: {id}")]
    VersionNotFound { id: String },

    #[error("relationship not found: {id}")]
    RelationshipNotFound { id: String },

    #[error("conflict on entity key {entity_key}: {reason}")]
    Conflict { entity_key: String, reason: String },

    #[error("invalid temporal bounds: {reason}")]
    InvalidTime { reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias.
pub type ChronicleResult<T> = Result<T, ChronicleError>;
