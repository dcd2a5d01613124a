//! Temporal query baselines over a seeded file-backed store.

use criterion::{criterion_group, criterion_main, Criterion};

use chrono::{Duration, TimeZone, Utc};
use serde_json::Map;

use chronicle_core::models::{AsOf, NewEntity, TxWindow};
use chronicle_storage::Store;
use chronicle_temporal::QueryEngine;

fn base_time() -> chrono::DateTime<chrono::Utc> {
    Utc.with_ymd_and_hms(2026, 2, 4, 8, 0, 0).unwrap()
}

/// 1000 jobs discovered with staggered lag, every 10th superseded once, a
/// chain of `depends_on` edges between consecutive jobs.
fn seeded_store() -> Store {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("bench_chronicle.db");
    let _dir = Box::leak(Box::new(dir));
    let store = Store::open(&db_path).unwrap();

    let base = base_time();
    let mut prev_id: Option<String> = None;
    for i in 0..1000i64 {
        let valid_from = base + Duration::minutes(i);
        let tx_from = valid_from + Duration::minutes(i % 90);
        let entity = store
            .entities()
            .insert(NewEntity {
                entity_type: "job".into(),
                entity_key: format!("J{i}"),
                valid_from: Some(valid_from),
                valid_to: None,
                tx_from,
                data: Map::new(),
            })
            .unwrap();

        if i % 10 == 0 {
            store
                .entities()
                .supersede(
                    &format!("J{i}"),
                    Some(valid_from),
                    Some(valid_from + Duration::minutes(5)),
                    Map::new(),
                    tx_from + Duration::minutes(30),
                )
                .unwrap();
        }

        if let Some(prev) = prev_id.as_deref() {
            store
                .relationships()
                .link("depends_on", &entity.id, prev, Some(valid_from), tx_from, Map::new())
                .unwrap();
        }
        prev_id = Some(entity.id);
    }

    store
}

fn bench_as_of_snapshot(c: &mut Criterion) {
    let store = seeded_store();
    let engine = QueryEngine::new(store.pool());
    let at = base_time() + Duration::hours(12);

    c.bench_function("as_of_snapshot_1k", |b| {
        b.iter(|| engine.as_of_snapshot(at, Some("job")).unwrap());
    });
}

fn bench_recent_changes(c: &mut Criterion) {
    let store = seeded_store();
    let engine = QueryEngine::new(store.pool());
    let since = base_time() + Duration::hours(8);

    c.bench_function("recent_changes_1k", |b| {
        b.iter(|| engine.recent_changes(since, None).unwrap());
    });
}

fn bench_discovery_lag(c: &mut Criterion) {
    let store = seeded_store();
    let engine = QueryEngine::new(store.pool());

    c.bench_function("discovery_lag_1k", |b| {
        b.iter(|| engine.discovery_lag("job", Duration::minutes(30)).unwrap());
    });
}

fn bench_aggregate_lag(c: &mut Criterion) {
    let store = seeded_store();
    let engine = QueryEngine::new(store.pool());
    let window = TxWindow {
        from: base_time(),
        to: base_time() + Duration::days(1),
    };

    c.bench_function("aggregate_lag_1k", |b| {
        b.iter(|| engine.aggregate_lag("job", window).unwrap());
    });
}

fn bench_entity_context(c: &mut Criterion) {
    let store = seeded_store();
    let engine = QueryEngine::new(store.pool());

    c.bench_function("entity_context_current", |b| {
        b.iter(|| engine.entity_context("J500", AsOf::Current).unwrap());
    });
}

criterion_group!(
    benches,
    bench_as_of_snapshot,
    bench_recent_changes,
    bench_discovery_lag,
    bench_aggregate_lag,
    bench_entity_context,
);
criterion_main!(benches);
