//! v002: temporal indexes for the core access patterns.
//!
//! The partial UNIQUE index on open entity versions is the schema-level
//! backstop for the single-current-version invariant: the "current version
//! pointer" is a derived index, not separately stored state.

use rusqlite::Connection;

use chronicle_core::ChronicleResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> ChronicleResult<()> {
    conn.execute_batch(
        "
        CREATE UNIQUE INDEX IF NOT EXISTS idx_entities_open_version
            ON entities(entity_key) WHERE tx_to IS NULL;

        CREATE INDEX IF NOT EXISTS idx_entities_key_tx
            ON entities(entity_key, tx_from, tx_to);
        CREATE INDEX IF NOT EXISTS idx_entities_type_tx
            ON entities(entity_type, tx_from);
        CREATE INDEX IF NOT EXISTS idx_entities_valid_range
            ON entities(valid_from, valid_to);

        CREATE INDEX IF NOT EXISTS idx_relationships_source_tx
            ON relationships(source_id, tx_from, tx_to);
        CREATE INDEX IF NOT EXISTS idx_relationships_target_tx
            ON relationships(target_id, tx_from, tx_to);
        CREATE INDEX IF NOT EXISTS idx_relationships_tx
            ON relationships(tx_from);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
