//! Relationship row model — a directed, typed edge between entity versions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A directed edge between two specific entity versions.
///
/// `source_id` and `target_id` reference `Entity::id` values, not keys: a
/// relationship is pinned to the versions it was asserted against. Both
/// endpoints must exist when the edge is created; they are not required to
/// remain the current version afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    /// Edge type, e.g. "uses_component", "references_job".
    pub rel_type: String,
    pub source_id: String,
    pub target_id: String,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
    pub tx_from: DateTime<Utc>,
    pub tx_to: Option<DateTime<Utc>>,
    /// Opaque edge payload, owned by collaborators.
    pub properties: Map<String, Value>,
}

impl Relationship {
    /// Generate an edge id in the `"rel-{8 hex}"` form.
    pub fn generate_id() -> String {
        let hex = Uuid::new_v4().simple().to_string();
        format!("rel-{}", &hex[..8])
    }

    /// Whether this edge is currently believed (open transaction interval).
    pub fn is_current(&self) -> bool {
        self.tx_to.is_none()
    }

    /// Whether this edge was believed at `tx_time` (`[tx_from, tx_to)`).
    pub fn believed_at(&self, tx_time: DateTime<Utc>) -> bool {
        self.tx_from <= tx_time && self.tx_to.map_or(true, |to| to > tx_time)
    }

    /// The endpoint opposite to `entity_id`.
    pub fn other_endpoint(&self, entity_id: &str) -> &str {
        if self.source_id == entity_id {
            &self.target_id
        } else {
            &self.source_id
        }
    }
}
