//! QueryEngine integration tests: snapshots, change feeds, and context.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Map, Value};

use chronicle_core::models::{AsOf, NewEntity};
use chronicle_storage::Store;
use chronicle_temporal::QueryEngine;

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn ts(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 4, h, m, 0).unwrap()
}

fn payload(status: &str) -> Map<String, Value> {
    let mut data = Map::new();
    data.insert("status".into(), json!(status));
    data
}

fn insert(
    store: &Store,
    entity_type: &str,
    key: &str,
    valid_from: DateTime<Utc>,
    tx_from: DateTime<Utc>,
    status: &str,
) {
    store
        .entities()
        .insert(NewEntity {
            entity_type: entity_type.into(),
            entity_key: key.into(),
            valid_from: Some(valid_from),
            valid_to: None,
            tx_from,
            data: payload(status),
        })
        .unwrap();
}

fn engine(store: &Store) -> QueryEngine {
    QueryEngine::new(store.pool())
}

// ─── Snapshots ───────────────────────────────────────────────────────────────

#[test]
fn snapshot_reflects_only_what_was_believed() {
    let store = Store::open_in_memory().unwrap();
    insert(&store, "job", "J1", ts(9, 0), ts(9, 5), "running");
    insert(&store, "job", "J2", ts(10, 0), ts(10, 5), "running");
    insert(&store, "ticket", "T1", ts(10, 0), ts(10, 10), "open");

    let engine = engine(&store);

    let early = engine.as_of_snapshot(ts(9, 30), None).unwrap();
    let keys: Vec<&str> = early.iter().map(|e| e.entity_key.as_str()).collect();
    assert_eq!(keys, vec!["J1"], "J2 and T1 not yet discovered at 9:30");

    let late = engine.as_of_snapshot(ts(11, 0), None).unwrap();
    assert_eq!(late.len(), 3);

    let jobs_only = engine.as_of_snapshot(ts(11, 0), Some("job")).unwrap();
    assert_eq!(jobs_only.len(), 2);
    assert!(jobs_only.iter().all(|e| e.entity_type == "job"));
}

#[test]
fn snapshot_shows_superseded_version_at_past_instant() {
    let store = Store::open_in_memory().unwrap();
    insert(&store, "job", "J1", ts(10, 0), ts(10, 45), "failure");
    store
        .entities()
        .supersede("J1", Some(ts(10, 0)), Some(ts(10, 15)), payload("success"), ts(11, 0))
        .unwrap();

    let engine = engine(&store);

    let before = engine.as_of_snapshot(ts(10, 50), None).unwrap();
    assert_eq!(before.len(), 1);
    assert_eq!(before[0].data["status"], json!("failure"));

    let after = engine.as_of_snapshot(ts(11, 5), None).unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].data["status"], json!("success"));
}

#[test]
fn snapshot_of_empty_store_is_empty() {
    let store = Store::open_in_memory().unwrap();
    let engine = engine(&store);
    assert!(engine.as_of_snapshot(ts(12, 0), None).unwrap().is_empty());
    assert!(engine.as_of_snapshot(ts(12, 0), Some("ghost")).unwrap().is_empty());
}

// ─── Change feed ─────────────────────────────────────────────────────────────

#[test]
fn recent_changes_lists_every_version_learned() {
    let store = Store::open_in_memory().unwrap();
    insert(&store, "job", "J1", ts(10, 0), ts(10, 45), "failure");
    store
        .entities()
        .supersede("J1", Some(ts(10, 0)), Some(ts(10, 15)), payload("success"), ts(11, 0))
        .unwrap();
    insert(&store, "job", "J2", ts(8, 0), ts(8, 5), "running");

    let engine = engine(&store);

    // Both J1 versions were learned after 10:30; J2's was not.
    let changes = engine.recent_changes(ts(10, 30), None).unwrap();
    assert_eq!(changes.len(), 2);
    assert!(changes.iter().all(|e| e.entity_key == "J1"));
    assert_eq!(changes[0].data["status"], json!("failure"), "oldest first");
    assert_eq!(changes[1].data["status"], json!("success"));

    // Boundary is inclusive at since.
    let from_1100 = engine.recent_changes(ts(11, 0), None).unwrap();
    assert_eq!(from_1100.len(), 1);
    assert_eq!(from_1100[0].data["status"], json!("success"));
}

// ─── Valid-time axis ─────────────────────────────────────────────────────────

#[test]
fn valid_at_filters_on_real_world_interval() {
    let store = Store::open_in_memory().unwrap();
    // True 9:00–10:00 (closed valid interval) and still true from 10:30.
    store
        .entities()
        .insert(NewEntity {
            entity_type: "job".into(),
            entity_key: "J1".into(),
            valid_from: Some(ts(9, 0)),
            valid_to: Some(ts(10, 0)),
            tx_from: ts(9, 5),
            data: payload("running"),
        })
        .unwrap();
    insert(&store, "job", "J2", ts(10, 30), ts(10, 35), "running");

    let engine = engine(&store);

    let at_930 = engine.valid_at(ts(9, 30), None).unwrap();
    let keys: Vec<&str> = at_930.iter().map(|e| e.entity_key.as_str()).collect();
    assert_eq!(keys, vec!["J1"]);

    let at_1015 = engine.valid_at(ts(10, 15), None).unwrap();
    assert!(at_1015.is_empty(), "gap between the two valid intervals");

    let at_1100 = engine.valid_at(ts(11, 0), None).unwrap();
    let keys: Vec<&str> = at_1100.iter().map(|e| e.entity_key.as_str()).collect();
    assert_eq!(keys, vec!["J2"]);
}

// ─── The late-discovery correction flow ──────────────────────────────────────

// A pipeline failure that started at 10:00 is discovered at 10:45 and
// corrected to "success, ended 10:15" at 11:00. All four reads must agree.
#[test]
fn late_discovery_then_correction_flow() {
    let store = Store::open_in_memory().unwrap();
    insert(&store, "job", "J1", ts(10, 0), ts(10, 45), "failure");
    store
        .entities()
        .supersede("J1", Some(ts(10, 0)), Some(ts(10, 15)), payload("success"), ts(11, 0))
        .unwrap();

    let engine = engine(&store);

    // Current belief: success.
    let current = store.entities().get_current("J1").unwrap().unwrap();
    assert_eq!(current.data["status"], json!("success"));

    // What we believed at 10:50: failure.
    let believed = store.entities().get_as_of("J1", ts(10, 50)).unwrap().unwrap();
    assert_eq!(believed.data["status"], json!("failure"));

    // The change feed since 10:30 shows both versions.
    let changes = engine.recent_changes(ts(10, 30), Some("job")).unwrap();
    assert_eq!(changes.len(), 2);

    // Discovery lag of the current version: 11:00 - 10:00 = 60 minutes.
    assert_eq!(
        current.discovery_lag(),
        Some(chrono::Duration::minutes(60))
    );
}

// ─── Entity context ──────────────────────────────────────────────────────────

#[test]
fn entity_context_assembles_both_directions() {
    let store = Store::open_in_memory().unwrap();
    insert(&store, "job", "J1", ts(9, 0), ts(9, 5), "running");
    insert(&store, "job", "J2", ts(9, 0), ts(9, 5), "running");
    insert(&store, "ticket", "T1", ts(9, 0), ts(9, 5), "open");
    let j1 = store.entities().get_current("J1").unwrap().unwrap();
    let j2 = store.entities().get_current("J2").unwrap().unwrap();
    let t1 = store.entities().get_current("T1").unwrap().unwrap();
    store
        .relationships()
        .link("depends_on", &j1.id, &j2.id, None, ts(9, 10), Map::new())
        .unwrap();
    store
        .relationships()
        .link("tracks", &t1.id, &j1.id, None, ts(9, 15), Map::new())
        .unwrap();

    let engine = engine(&store);
    let context = engine.entity_context("J1", AsOf::Current).unwrap().unwrap();

    assert_eq!(context.entity.entity_key, "J1");
    assert_eq!(context.neighbor_count(), 2);
    assert_eq!(context.outgoing.len(), 1);
    assert_eq!(context.outgoing[0].1.entity_key, "J2");
    assert_eq!(context.incoming.len(), 1);
    assert_eq!(context.incoming[0].0.rel_type, "tracks");
    assert_eq!(context.incoming[0].1.entity_key, "T1");
}

#[test]
fn entity_context_respects_the_instant() {
    let store = Store::open_in_memory().unwrap();
    insert(&store, "job", "J1", ts(9, 0), ts(9, 5), "running");
    insert(&store, "job", "J2", ts(9, 0), ts(9, 5), "running");
    let j1 = store.entities().get_current("J1").unwrap().unwrap();
    let j2 = store.entities().get_current("J2").unwrap().unwrap();
    store
        .relationships()
        .link("depends_on", &j1.id, &j2.id, None, ts(10, 0), Map::new())
        .unwrap();

    let engine = engine(&store);

    // Before the key was discovered there is no context at all.
    assert!(engine.entity_context("J1", AsOf::At(ts(9, 0))).unwrap().is_none());

    // After discovery but before the link: entity alone.
    let early = engine.entity_context("J1", AsOf::At(ts(9, 30))).unwrap().unwrap();
    assert_eq!(early.neighbor_count(), 0);

    // After the link.
    let late = engine.entity_context("J1", AsOf::At(ts(10, 30))).unwrap().unwrap();
    assert_eq!(late.neighbor_count(), 1);
}

#[test]
fn entity_context_unknown_key_is_none() {
    let store = Store::open_in_memory().unwrap();
    let engine = engine(&store);
    assert!(engine.entity_context("ghost", AsOf::Current).unwrap().is_none());
}

// ─── Stats ───────────────────────────────────────────────────────────────────

#[test]
fn stats_count_current_rows_by_type() {
    let store = Store::open_in_memory().unwrap();
    insert(&store, "job", "J1", ts(9, 0), ts(9, 5), "running");
    insert(&store, "job", "J2", ts(9, 0), ts(9, 5), "running");
    insert(&store, "ticket", "T1", ts(9, 0), ts(9, 5), "open");
    // Superseding does not change the current count.
    store
        .entities()
        .supersede("J1", Some(ts(9, 0)), None, payload("done"), ts(10, 0))
        .unwrap();

    let j1 = store.entities().get_current("J1").unwrap().unwrap();
    let j2 = store.entities().get_current("J2").unwrap().unwrap();
    let rel = store
        .relationships()
        .link("depends_on", &j1.id, &j2.id, None, ts(10, 5), Map::new())
        .unwrap();

    let engine = engine(&store);
    let stats = engine.stats().unwrap();
    assert_eq!(stats.total_entities, 3);
    assert_eq!(stats.entities_by_type.get("job"), Some(&2));
    assert_eq!(stats.entities_by_type.get("ticket"), Some(&1));
    assert_eq!(stats.total_relationships, 1);
    assert_eq!(stats.relationships_by_type.get("depends_on"), Some(&1));

    // A closed edge drops out of the current counts.
    store.relationships().unlink(&rel.id, ts(11, 0)).unwrap();
    let stats = engine.stats().unwrap();
    assert_eq!(stats.total_relationships, 0);
}
