//! v001: schema_version bookkeeping plus the two bi-temporal tables.

use rusqlite::Connection;

use chronicle_core::ChronicleResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> ChronicleResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE TABLE IF NOT EXISTS entities (
            id          TEXT PRIMARY KEY,
            entity_type TEXT NOT NULL,
            entity_key  TEXT NOT NULL,
            valid_from  TEXT,
            valid_to    TEXT,
            tx_from     TEXT NOT NULL,
            tx_to       TEXT,
            data        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS relationships (
            id         TEXT PRIMARY KEY,
            rel_type   TEXT NOT NULL,
            source_id  TEXT NOT NULL,
            target_id  TEXT NOT NULL,
            valid_from TEXT,
            valid_to   TEXT,
            tx_from    TEXT NOT NULL,
            tx_to      TEXT,
            properties TEXT NOT NULL DEFAULT '{}',
            FOREIGN KEY (source_id) REFERENCES entities(id),
            FOREIGN KEY (target_id) REFERENCES entities(id)
        );
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
