//! One-hop context assembly: an entity and its neighborhood at one instant.

use rusqlite::Connection;

use chronicle_core::models::{AsOf, Direction, EntityContext};
use chronicle_core::ChronicleResult;
use chronicle_storage::queries::{entity_ops, relationship_ops};

/// Resolve `entity_key` at `as_of` and attach both neighbor directions at the
/// same instant, giving callers one consistent view of "what do we know
/// about X".
///
/// `Ok(None)` when the key had no believed version at the instant — a valid
/// business state, distinct from any storage failure.
pub fn entity_context(
    conn: &Connection,
    entity_key: &str,
    as_of: AsOf,
) -> ChronicleResult<Option<EntityContext>> {
    let entity = match as_of {
        AsOf::Current => entity_ops::get_open_version(conn, entity_key)?,
        AsOf::At(t) => entity_ops::get_version_as_of(conn, entity_key, t)?,
    };
    let Some(entity) = entity else {
        return Ok(None);
    };

    let outgoing = relationship_ops::neighbors_at(conn, &entity.id, Direction::Outgoing, as_of)?;
    let incoming = relationship_ops::neighbors_at(conn, &entity.id, Direction::Incoming, as_of)?;

    Ok(Some(EntityContext {
        entity,
        outgoing,
        incoming,
    }))
}
