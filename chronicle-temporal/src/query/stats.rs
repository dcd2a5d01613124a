//! Current-belief counts grouped by type.

use rusqlite::Connection;

use chronicle_core::models::StoreStats;
use chronicle_core::ChronicleResult;
use chronicle_storage::queries::{relationship_ops, temporal_ops};

pub fn store_stats(conn: &Connection) -> ChronicleResult<StoreStats> {
    let entities_by_type = temporal_ops::current_entity_counts(conn)?;
    let relationships_by_type = relationship_ops::current_relationship_counts(conn)?;

    Ok(StoreStats {
        total_entities: entities_by_type.values().sum(),
        total_relationships: relationships_by_type.values().sum(),
        entities_by_type,
        relationships_by_type,
    })
}
