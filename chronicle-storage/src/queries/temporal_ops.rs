//! Raw SQL for the temporal read patterns: snapshots, change feed, and
//! current-version scans. Uses the indexes created in v002.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use chronicle_core::models::Entity;
use chronicle_core::ChronicleResult;

use crate::to_storage_err;

use super::entity_ops::{query_many, ENTITY_COLUMNS};
use super::fmt_ts;

/// Everything the store believed at `tx_time`, optionally filtered by type.
///
/// The single-current invariant guarantees at most one covering version per
/// key, so a plain interval filter is a correct snapshot — no grouping needed.
/// Ordered newest-learned first, ties broken by id.
pub fn snapshot_at(
    conn: &Connection,
    tx_time: DateTime<Utc>,
    entity_type: Option<&str>,
) -> ChronicleResult<Vec<Entity>> {
    let ts = fmt_ts(tx_time);
    match entity_type {
        Some(et) => {
            let query = format!(
                "SELECT {ENTITY_COLUMNS} FROM entities
                 WHERE tx_from <= ?1 AND (tx_to IS NULL OR tx_to > ?1)
                   AND entity_type = ?2
                 ORDER BY tx_from DESC, id ASC"
            );
            query_many(conn, &query, params![ts, et])
        }
        None => {
            let query = format!(
                "SELECT {ENTITY_COLUMNS} FROM entities
                 WHERE tx_from <= ?1 AND (tx_to IS NULL OR tx_to > ?1)
                 ORDER BY tx_from DESC, id ASC"
            );
            query_many(conn, &query, params![ts])
        }
    }
}

/// Every version (current or superseded) learned at or after `since`.
/// Ordered oldest first — the append/change feed.
pub fn changes_since(
    conn: &Connection,
    since: DateTime<Utc>,
    entity_type: Option<&str>,
) -> ChronicleResult<Vec<Entity>> {
    let ts = fmt_ts(since);
    match entity_type {
        Some(et) => {
            let query = format!(
                "SELECT {ENTITY_COLUMNS} FROM entities
                 WHERE tx_from >= ?1 AND entity_type = ?2
                 ORDER BY tx_from ASC, id ASC"
            );
            query_many(conn, &query, params![ts, et])
        }
        None => {
            let query = format!(
                "SELECT {ENTITY_COLUMNS} FROM entities
                 WHERE tx_from >= ?1
                 ORDER BY tx_from ASC, id ASC"
            );
            query_many(conn, &query, params![ts])
        }
    }
}

/// Current-belief rows whose *valid* interval covers `valid_time` —
/// "what was true at T" on the real-world axis. Rows with an unknown
/// `valid_from` never match.
pub fn valid_at(
    conn: &Connection,
    valid_time: DateTime<Utc>,
    entity_type: Option<&str>,
) -> ChronicleResult<Vec<Entity>> {
    let ts = fmt_ts(valid_time);
    match entity_type {
        Some(et) => {
            let query = format!(
                "SELECT {ENTITY_COLUMNS} FROM entities
                 WHERE valid_from <= ?1 AND (valid_to IS NULL OR valid_to > ?1)
                   AND tx_to IS NULL AND entity_type = ?2
                 ORDER BY valid_from DESC, id ASC"
            );
            query_many(conn, &query, params![ts, et])
        }
        None => {
            let query = format!(
                "SELECT {ENTITY_COLUMNS} FROM entities
                 WHERE valid_from <= ?1 AND (valid_to IS NULL OR valid_to > ?1)
                   AND tx_to IS NULL
                 ORDER BY valid_from DESC, id ASC"
            );
            query_many(conn, &query, params![ts])
        }
    }
}

/// All current versions of one entity type. Feeds the lag queries.
pub fn current_by_type(conn: &Connection, entity_type: &str) -> ChronicleResult<Vec<Entity>> {
    let query = format!(
        "SELECT {ENTITY_COLUMNS} FROM entities
         WHERE entity_type = ?1 AND tx_to IS NULL
         ORDER BY tx_from ASC, id ASC"
    );
    query_many(conn, &query, params![entity_type])
}

/// Count of current entity versions, grouped by type.
pub fn current_entity_counts(conn: &Connection) -> ChronicleResult<BTreeMap<String, u64>> {
    counts_grouped(
        conn,
        "SELECT entity_type, COUNT(*) FROM entities WHERE tx_to IS NULL GROUP BY entity_type",
    )
}

pub(crate) fn counts_grouped(
    conn: &Connection,
    query: &str,
) -> ChronicleResult<BTreeMap<String, u64>> {
    let mut stmt = conn
        .prepare(query)
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?)))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut counts = BTreeMap::new();
    for row in rows {
        let (kind, count) = row.map_err(|e| to_storage_err(e.to_string()))?;
        counts.insert(kind, count);
    }
    Ok(counts)
}
