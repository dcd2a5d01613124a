//! Discovery-lag analysis: how long after a fact became true did the store
//! learn it.

use chrono::Duration;
use rusqlite::Connection;
use tracing::debug;

use chronicle_core::models::{LagEntry, LagStats, TxWindow};
use chronicle_core::ChronicleResult;
use chronicle_storage::queries::temporal_ops;

/// Current versions of `entity_type` with `lag = tx_from - valid_from` of at
/// least `min_lag`, sorted worst-first. Unknown `valid_from` excludes the row
/// entirely — treating it as zero would systematically under-report lag.
pub fn discovery_lag(
    conn: &Connection,
    entity_type: &str,
    min_lag: Duration,
) -> ChronicleResult<Vec<LagEntry>> {
    let current = temporal_ops::current_by_type(conn, entity_type)?;

    let mut late: Vec<LagEntry> = current
        .into_iter()
        .filter_map(|entity| {
            let lag = entity.discovery_lag()?;
            (lag >= min_lag).then_some(LagEntry { entity, lag })
        })
        .collect();

    // Worst first; id tie-break keeps output deterministic.
    late.sort_by(|a, b| b.lag.cmp(&a.lag).then_with(|| a.entity.id.cmp(&b.entity.id)));

    debug!(entity_type, count = late.len(), "discovery lag query");
    Ok(late)
}

/// Aggregate lag statistics for current versions whose `tx_from` falls
/// inside `window`.
pub fn aggregate_lag(
    conn: &Connection,
    entity_type: &str,
    window: TxWindow,
) -> ChronicleResult<LagStats> {
    let current = temporal_ops::current_by_type(conn, entity_type)?;

    let mut lags: Vec<Duration> = current
        .iter()
        .filter(|entity| window.contains(entity.tx_from))
        .filter_map(|entity| entity.discovery_lag())
        .collect();

    if lags.is_empty() {
        return Ok(LagStats::empty());
    }

    lags.sort();

    let count = lags.len();
    let total_ms: i64 = lags.iter().map(|lag| lag.num_milliseconds()).sum();

    Ok(LagStats {
        count,
        mean: Duration::milliseconds(total_ms / count as i64),
        p50: percentile(&lags, 50),
        p95: percentile(&lags, 95),
        max: lags[count - 1],
    })
}

/// Rank-based percentile: the value at rank `ceil(p/100 * n)`, 1-indexed,
/// in the ascending-sorted sample. No interpolation.
fn percentile(sorted: &[Duration], p: u32) -> Duration {
    let n = sorted.len();
    let rank = (u64::from(p) * n as u64).div_ceil(100) as usize;
    sorted[rank.clamp(1, n) - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes(values: &[i64]) -> Vec<Duration> {
        values.iter().map(|m| Duration::minutes(*m)).collect()
    }

    #[test]
    fn percentile_uses_ceiling_rank() {
        let sample = minutes(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        // ceil(0.50 * 10) = 5 -> 5th value
        assert_eq!(percentile(&sample, 50), Duration::minutes(5));
        // ceil(0.95 * 10) = 10 -> last value
        assert_eq!(percentile(&sample, 95), Duration::minutes(10));
    }

    #[test]
    fn percentile_single_element() {
        let sample = minutes(&[42]);
        assert_eq!(percentile(&sample, 50), Duration::minutes(42));
        assert_eq!(percentile(&sample, 95), Duration::minutes(42));
    }

    #[test]
    fn percentile_odd_sample() {
        let sample = minutes(&[10, 20, 30]);
        // ceil(0.50 * 3) = 2 -> 20
        assert_eq!(percentile(&sample, 50), Duration::minutes(20));
        // ceil(0.95 * 3) = 3 -> 30
        assert_eq!(percentile(&sample, 95), Duration::minutes(30));
    }
}
