//! Insert, close, and direction-aware traversal for relationship rows.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use chronicle_core::models::{AsOf, Direction, Entity, Relationship};
use chronicle_core::ChronicleResult;

use crate::to_storage_err;

use super::{entity_ops, fmt_ts, parse_opt_ts, parse_ts};

const REL_COLUMNS: &str =
    "id, rel_type, source_id, target_id, valid_from, valid_to, tx_from, tx_to, properties";

/// Insert a single relationship row.
pub fn insert_relationship(conn: &Connection, rel: &Relationship) -> ChronicleResult<()> {
    let properties_json = serde_json::to_string(&rel.properties)?;

    conn.execute(
        "INSERT INTO relationships (
            id, rel_type, source_id, target_id, valid_from, valid_to, tx_from, tx_to, properties
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            rel.id,
            rel.rel_type,
            rel.source_id,
            rel.target_id,
            rel.valid_from.map(fmt_ts),
            rel.valid_to.map(fmt_ts),
            fmt_ts(rel.tx_from),
            rel.tx_to.map(fmt_ts),
            properties_json,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    Ok(())
}

/// Point lookup by relationship id.
pub fn get_relationship(conn: &Connection, id: &str) -> ChronicleResult<Option<Relationship>> {
    let query = format!("SELECT {REL_COLUMNS} FROM relationships WHERE id = ?1");
    let mut stmt = conn
        .prepare(&query)
        .map_err(|e| to_storage_err(e.to_string()))?;

    let result = stmt
        .query_map(params![id], |row| Ok(row_to_relationship(row)))
        .map_err(|e| to_storage_err(e.to_string()))?
        .next();

    match result {
        Some(Ok(parsed)) => Ok(Some(parsed?)),
        Some(Err(e)) => Err(to_storage_err(e.to_string())),
        None => Ok(None),
    }
}

/// Close the transaction interval of an open relationship.
/// Returns 0 when the row is already closed (or absent) — the caller decides
/// whether that is an idempotent no-op or an unknown id.
pub fn close_relationship(
    conn: &Connection,
    id: &str,
    at_tx_time: DateTime<Utc>,
) -> ChronicleResult<usize> {
    conn.execute(
        "UPDATE relationships SET tx_to = ?2 WHERE id = ?1 AND tx_to IS NULL",
        params![id, fmt_ts(at_tx_time)],
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

/// Relationships touching `entity_id` in the given direction whose tx
/// interval covers the `as_of` instant. Ordered by `(tx_from, id)` for
/// deterministic traversal output.
pub fn rels_touching(
    conn: &Connection,
    entity_id: &str,
    direction: Direction,
    as_of: AsOf,
) -> ChronicleResult<Vec<Relationship>> {
    let direction_clause = match direction {
        Direction::Outgoing => "source_id = ?1",
        Direction::Incoming => "target_id = ?1",
        Direction::Both => "(source_id = ?1 OR target_id = ?1)",
    };

    let (tx_clause, ts) = match as_of {
        AsOf::Current => ("tx_to IS NULL".to_string(), None),
        AsOf::At(t) => (
            "tx_from <= ?2 AND (tx_to IS NULL OR tx_to > ?2)".to_string(),
            Some(fmt_ts(t)),
        ),
    };

    let query = format!(
        "SELECT {REL_COLUMNS} FROM relationships
         WHERE {direction_clause} AND {tx_clause}
         ORDER BY tx_from ASC, id ASC"
    );

    let mut stmt = conn
        .prepare(&query)
        .map_err(|e| to_storage_err(e.to_string()))?;

    let map_row = |row: &rusqlite::Row<'_>| Ok(row_to_relationship(row));
    let rows = match &ts {
        Some(t) => stmt.query_map(params![entity_id, t], map_row),
        None => stmt.query_map(params![entity_id], map_row),
    }
    .map_err(|e| to_storage_err(e.to_string()))?;

    let mut results = Vec::new();
    for row in rows {
        let rel = row.map_err(|e| to_storage_err(e.to_string()))??;
        results.push(rel);
    }
    Ok(results)
}

/// One-hop traversal: each covering relationship paired with the opposite
/// endpoint resolved *as of the same instant*.
///
/// The pinned endpoint id only supplies the logical key; the returned entity
/// is that key's version believed at the instant. Pairs whose key had no
/// believed version then are omitted (the historical link dangles).
pub fn neighbors_at(
    conn: &Connection,
    entity_id: &str,
    direction: Direction,
    as_of: AsOf,
) -> ChronicleResult<Vec<(Relationship, Entity)>> {
    let rels = rels_touching(conn, entity_id, direction, as_of)?;

    let mut pairs = Vec::with_capacity(rels.len());
    for rel in rels {
        let other_id = rel.other_endpoint(entity_id).to_string();
        let Some(pinned) = entity_ops::get_entity(conn, &other_id)? else {
            continue;
        };
        let resolved = match as_of {
            AsOf::Current => entity_ops::get_open_version(conn, &pinned.entity_key)?,
            AsOf::At(t) => entity_ops::get_version_as_of(conn, &pinned.entity_key, t)?,
        };
        if let Some(entity) = resolved {
            pairs.push((rel, entity));
        }
    }
    Ok(pairs)
}

/// Count of current relationships, grouped by type.
pub fn current_relationship_counts(conn: &Connection) -> ChronicleResult<BTreeMap<String, u64>> {
    super::temporal_ops::counts_grouped(
        conn,
        "SELECT rel_type, COUNT(*) FROM relationships WHERE tx_to IS NULL GROUP BY rel_type",
    )
}

fn row_to_relationship(row: &rusqlite::Row<'_>) -> ChronicleResult<Relationship> {
    let valid_from: Option<String> = row.get(4).map_err(|e| to_storage_err(e.to_string()))?;
    let valid_to: Option<String> = row.get(5).map_err(|e| to_storage_err(e.to_string()))?;
    let tx_from: String = row.get(6).map_err(|e| to_storage_err(e.to_string()))?;
    let tx_to: Option<String> = row.get(7).map_err(|e| to_storage_err(e.to_string()))?;
    let properties_json: String = row.get(8).map_err(|e| to_storage_err(e.to_string()))?;

    Ok(Relationship {
        id: row.get(0).map_err(|e| to_storage_err(e.to_string()))?,
        rel_type: row.get(1).map_err(|e| to_storage_err(e.to_string()))?,
        source_id: row.get(2).map_err(|e| to_storage_err(e.to_string()))?,
        target_id: row.get(3).map_err(|e| to_storage_err(e.to_string()))?,
        valid_from: parse_opt_ts(valid_from.as_deref())?,
        valid_to: parse_opt_ts(valid_to.as_deref())?,
        tx_from: parse_ts(&tx_from)?,
        tx_to: parse_opt_ts(tx_to.as_deref())?,
        properties: serde_json::from_str(&properties_json)
            .map_err(|e| to_storage_err(format!("parse relationship properties: {e}")))?,
    })
}
