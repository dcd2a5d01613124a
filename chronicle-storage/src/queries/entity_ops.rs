//! Insert, point lookups, and version bookkeeping for entity rows.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use chronicle_core::models::Entity;
use chronicle_core::ChronicleResult;

use crate::to_storage_err;

use super::{fmt_ts, parse_opt_ts, parse_ts};

pub(crate) const ENTITY_COLUMNS: &str =
    "id, entity_type, entity_key, valid_from, valid_to, tx_from, tx_to, data";

/// Insert a single entity version row.
pub fn insert_entity(conn: &Connection, entity: &Entity) -> ChronicleResult<()> {
    let data_json = serde_json::to_string(&entity.data)?;

    conn.execute(
        "INSERT INTO entities (
            id, entity_type, entity_key, valid_from, valid_to, tx_from, tx_to, data
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            entity.id,
            entity.entity_type,
            entity.entity_key,
            entity.valid_from.map(fmt_ts),
            entity.valid_to.map(fmt_ts),
            fmt_ts(entity.tx_from),
            entity.tx_to.map(fmt_ts),
            data_json,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    Ok(())
}

/// Exact version lookup by row id.
pub fn get_entity(conn: &Connection, id: &str) -> ChronicleResult<Option<Entity>> {
    let query = format!("SELECT {ENTITY_COLUMNS} FROM entities WHERE id = ?1");
    query_one(conn, &query, params![id])
}

/// The open (current) version for a key, if any.
pub fn get_open_version(conn: &Connection, entity_key: &str) -> ChronicleResult<Option<Entity>> {
    let query =
        format!("SELECT {ENTITY_COLUMNS} FROM entities WHERE entity_key = ?1 AND tx_to IS NULL");
    query_one(conn, &query, params![entity_key])
}

/// The version of a key whose `[tx_from, tx_to)` interval covers `tx_time`.
pub fn get_version_as_of(
    conn: &Connection,
    entity_key: &str,
    tx_time: DateTime<Utc>,
) -> ChronicleResult<Option<Entity>> {
    let query = format!(
        "SELECT {ENTITY_COLUMNS} FROM entities
         WHERE entity_key = ?1 AND tx_from <= ?2
           AND (tx_to IS NULL OR tx_to > ?2)"
    );
    query_one(conn, &query, params![entity_key, fmt_ts(tx_time)])
}

/// Close the transaction interval of an open version.
///
/// The `tx_to IS NULL` guard is the optimistic check: a concurrent supersede
/// that already closed the row makes this return 0 rows.
pub fn close_version(
    conn: &Connection,
    id: &str,
    at_tx_time: DateTime<Utc>,
) -> ChronicleResult<usize> {
    conn.execute(
        "UPDATE entities SET tx_to = ?2 WHERE id = ?1 AND tx_to IS NULL",
        params![id, fmt_ts(at_tx_time)],
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

pub(crate) fn query_one(
    conn: &Connection,
    query: &str,
    params: impl rusqlite::Params,
) -> ChronicleResult<Option<Entity>> {
    let mut stmt = conn
        .prepare(query)
        .map_err(|e| to_storage_err(e.to_string()))?;

    let result = stmt
        .query_map(params, |row| Ok(row_to_entity(row)))
        .map_err(|e| to_storage_err(e.to_string()))?
        .next();

    match result {
        Some(Ok(parsed)) => Ok(Some(parsed?)),
        Some(Err(e)) => Err(to_storage_err(e.to_string())),
        None => Ok(None),
    }
}

pub(crate) fn query_many(
    conn: &Connection,
    query: &str,
    params: impl rusqlite::Params,
) -> ChronicleResult<Vec<Entity>> {
    let mut stmt = conn
        .prepare(query)
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map(params, |row| Ok(row_to_entity(row)))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut results = Vec::new();
    for row in rows {
        let entity = row.map_err(|e| to_storage_err(e.to_string()))??;
        results.push(entity);
    }
    Ok(results)
}

/// Parse a row in `ENTITY_COLUMNS` order into an `Entity`.
pub(crate) fn row_to_entity(row: &rusqlite::Row<'_>) -> ChronicleResult<Entity> {
    let valid_from: Option<String> = row.get(3).map_err(|e| to_storage_err(e.to_string()))?;
    let valid_to: Option<String> = row.get(4).map_err(|e| to_storage_err(e.to_string()))?;
    let tx_from: String = row.get(5).map_err(|e| to_storage_err(e.to_string()))?;
    let tx_to: Option<String> = row.get(6).map_err(|e| to_storage_err(e.to_string()))?;
    let data_json: String = row.get(7).map_err(|e| to_storage_err(e.to_string()))?;

    Ok(Entity {
        id: row.get(0).map_err(|e| to_storage_err(e.to_string()))?,
        entity_type: row.get(1).map_err(|e| to_storage_err(e.to_string()))?,
        entity_key: row.get(2).map_err(|e| to_storage_err(e.to_string()))?,
        valid_from: parse_opt_ts(valid_from.as_deref())?,
        valid_to: parse_opt_ts(valid_to.as_deref())?,
        tx_from: parse_ts(&tx_from)?,
        tx_to: parse_opt_ts(tx_to.as_deref())?,
        data: serde_json::from_str(&data_json)
            .map_err(|e| to_storage_err(format!("parse entity data: {e}")))?,
    })
}
