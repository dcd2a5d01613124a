//! Raw SQL operations. The only code that touches the schema directly.

pub mod entity_ops;
pub mod relationship_ops;
pub mod temporal_ops;

use chrono::{DateTime, SecondsFormat, Utc};

use chronicle_core::ChronicleResult;

use crate::to_storage_err;

/// Fixed-width RFC 3339 UTC with millisecond precision.
///
/// All timestamp columns use this one format so lexicographic SQL comparison
/// equals chronological comparison.
pub(crate) fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_ts(s: &str) -> ChronicleResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| to_storage_err(format!("parse datetime '{s}': {e}")))
}

pub(crate) fn parse_opt_ts(s: Option<&str>) -> ChronicleResult<Option<DateTime<Utc>>> {
    s.map(parse_ts).transpose()
}
