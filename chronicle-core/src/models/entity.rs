//! Entity row model — one versioned fact about one real-world object.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// One version of a fact about a real-world object.
///
/// Bi-temporal: `valid_from`/`valid_to` is the real-world interval during
/// which `data` was true, `tx_from`/`tx_to` is the system interval during
/// which the store believed this version. `tx_to = None` marks the current
/// version; at most one row per `entity_key` is current at any instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Store-generated, unique per version. Immutable once created.
    pub id: String,
    /// Classifies the fact (e.g. "job", "ticket"). Stable across versions.
    pub entity_type: String,
    /// Logical identifier shared by all versions of the same object.
    pub entity_key: String,
    /// When the fact became true in reality. `None` when the start is unknown.
    pub valid_from: Option<DateTime<Utc>>,
    /// When the fact stopped being true. `None` while still true as far as known.
    pub valid_to: Option<DateTime<Utc>>,
    /// When the store learned this version.
    pub tx_from: DateTime<Utc>,
    /// When the store stopped believing this version. `None` = current belief.
    pub tx_to: Option<DateTime<Utc>>,
    /// Opaque payload. Schema belongs to collaborators, keyed by `entity_type`.
    pub data: Map<String, Value>,
}

impl Entity {
    /// Generate a version id in the `"{entity_type}-{8 hex}"` form.
    pub fn generate_id(entity_type: &str) -> String {
        let hex = Uuid::new_v4().simple().to_string();
        format!("{entity_type}-{}", &hex[..8])
    }

    /// Whether this row is the current belief (open transaction interval).
    pub fn is_current(&self) -> bool {
        self.tx_to.is_none()
    }

    /// Whether this version was believed at `tx_time`.
    /// The transaction interval is half-open: `[tx_from, tx_to)`.
    pub fn believed_at(&self, tx_time: DateTime<Utc>) -> bool {
        self.tx_from <= tx_time && self.tx_to.map_or(true, |to| to > tx_time)
    }

    /// Discovery lag: `tx_from - valid_from`.
    ///
    /// `None` when the real-world start is unknown — an unknown start is
    /// not zero lag, and lag queries exclude such rows entirely.
    pub fn discovery_lag(&self) -> Option<Duration> {
        self.valid_from.map(|valid_from| self.tx_from - valid_from)
    }
}

/// Caller-supplied fields for a new entity version.
///
/// The store owns row identity (`id`) and all transaction-end bookkeeping;
/// callers own the payload and the valid-time assertion.
#[derive(Debug, Clone)]
pub struct NewEntity {
    pub entity_type: String,
    pub entity_key: String,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
    pub tx_from: DateTime<Utc>,
    pub data: Map<String, Value>,
}
