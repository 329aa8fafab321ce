//! End-to-end store behaviour through the public API.

use std::sync::Arc;

use recordstore::layout::collection;
use recordstore::{
    Filter, KeyLayout, KvBackend, MemoryKv, ObjectStore, SimClock, StorageError, SyncStore,
};
use serde_json::json;

fn sim_store() -> (ObjectStore, Arc<MemoryKv>, SimClock) {
    let backend = Arc::new(MemoryKv::new());
    let clock = SimClock::at_ms(1_700_000_000_000);
    let store = ObjectStore::new(backend.clone())
        .with_layout(KeyLayout::fitness_defaults())
        .with_clock(Arc::new(clock.clone()));
    (store, backend, clock)
}

// =============================================================================
// Record Lifecycle
// =============================================================================

#[tokio::test]
async fn test_client_lifecycle() {
    let (store, backend, clock) = sim_store();

    let created = store
        .create(collection::CLIENT, json!({"id": "u1", "name": "Alex"}))
        .await
        .unwrap();
    assert_eq!(created.id, "u1");
    assert_eq!(
        created.get_str("created_at"),
        Some("2023-11-14T22:13:20.000000Z")
    );
    assert!(backend.exists("client:u1").await.unwrap());
    assert_eq!(
        backend.get("index:client").await.unwrap().as_deref(),
        Some(r#"["u1"]"#)
    );

    clock.advance_ms(1_000);
    let updated = store
        .update(collection::CLIENT, "u1", json!({"email": "a@x"}))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.get_str("name"), Some("Alex"));
    assert_eq!(updated.get_str("email"), Some("a@x"));
    assert_eq!(updated.get_str("created_at"), created.get_str("created_at"));
    assert!(updated.updated_at().unwrap() > updated.created_at().unwrap());

    let fetched = store.get(collection::CLIENT, "u1").await.unwrap();
    assert_eq!(fetched.as_ref(), Some(&updated));

    let by_name = store
        .find_many(collection::CLIENT, &Filter::new().with("name", "Alex"))
        .await
        .unwrap();
    assert_eq!(by_name, vec![updated]);

    assert!(store.delete(collection::CLIENT, "u1").await.unwrap());
    assert!(store.get(collection::CLIENT, "u1").await.unwrap().is_none());
    assert!(store.get_all(collection::CLIENT, None).await.unwrap().is_empty());
    assert_eq!(
        backend.get("index:client").await.unwrap().as_deref(),
        Some("[]")
    );
}

#[tokio::test]
async fn test_fitness_prefixes() {
    let (store, backend, _) = sim_store();

    store
        .create(collection::WORKOUT_LOG, json!({"id": "w1"}))
        .await
        .unwrap();
    store
        .create(collection::PROGRESS_PHOTO, json!({"id": "p1"}))
        .await
        .unwrap();
    store
        .create(collection::ACHIEVEMENT, json!({"id": "a1"}))
        .await
        .unwrap();

    assert!(backend.exists("log:w1").await.unwrap());
    assert!(backend.exists("photo:p1").await.unwrap());
    assert!(backend.exists("achievement:a1").await.unwrap());

    assert_eq!(
        store.collections().await.unwrap(),
        vec!["achievement", "progress_photo", "workout_log"]
    );
}

#[tokio::test]
async fn test_filter_and_relations() {
    let (store, _, _) = sim_store();

    store
        .create(collection::CLIENT, json!({"id": "u1", "name": "Alex"}))
        .await
        .unwrap();
    for week in 1..=3 {
        store
            .add_relation(
                collection::CLIENT,
                "u1",
                collection::WORKOUT_LOG,
                json!({"week": week, "done": week < 3}),
            )
            .await
            .unwrap();
    }

    let logs = store
        .get_related(collection::CLIENT, "u1", collection::WORKOUT_LOG)
        .await
        .unwrap();
    assert_eq!(logs.len(), 3);

    let pending = store
        .query(collection::WORKOUT_LOG)
        .filter_by("client_id", "u1")
        .filter_by("done", false)
        .all()
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].get_i64("week"), Some(3));
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_keep_every_id_indexed() {
    let (store, _, _) = sim_store();

    let handles: Vec<_> = (0..64)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .create(collection::MESSAGE, json!({"seq": i}))
                    .await
                    .unwrap()
                    .id
            })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }

    let listed = store.get_all(collection::MESSAGE, None).await.unwrap();
    assert_eq!(listed.len(), 64);
    for id in &ids {
        assert!(listed.iter().any(|r| &r.id == id), "missing {id}");
    }
}

#[test]
fn test_sync_store_from_plain_threads() {
    let sync = SyncStore::new(ObjectStore::in_memory());
    sync.create(collection::CLIENT, json!({"id": "u1"})).unwrap();

    std::thread::scope(|scope| {
        for i in 0..4 {
            let sync = &sync;
            scope.spawn(move || {
                sync.add_relation(collection::CLIENT, "u1", collection::MESSAGE, json!({"n": i}))
                    .unwrap();
            });
        }
    });

    assert_eq!(
        sync.get_related(collection::CLIENT, "u1", collection::MESSAGE)
            .unwrap()
            .len(),
        4
    );
}

// =============================================================================
// Failure Propagation
// =============================================================================

#[tokio::test]
async fn test_backend_faults_surface_as_errors() {
    let (store, backend, _) = sim_store();
    store
        .create(collection::CLIENT, json!({"id": "u1"}))
        .await
        .unwrap();

    backend.fail_operation("get");
    let err = store.get(collection::CLIENT, "u1").await.unwrap_err();
    assert!(matches!(err, StorageError::SimulatedFault { .. }));
    assert!(err.is_transient());
    backend.clear_faults();

    backend.fail_operation("compare_and_swap");
    let err = store
        .create(collection::CLIENT, json!({"id": "u2"}))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::SimulatedFault { .. }));
    backend.clear_faults();

    // The record write landed before the index write failed
    assert!(store.exists(collection::CLIENT, "u2").await.unwrap());
    let listed = store.get_all(collection::CLIENT, None).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_corrupt_record_is_a_deserialization_error() {
    let (store, backend, _) = sim_store();
    backend.set("client:bad", "not json").await.unwrap();

    let err = store.get(collection::CLIENT, "bad").await.unwrap_err();
    assert!(matches!(
        err,
        StorageError::Deserialization { ref key, .. } if key == "client:bad"
    ));
}
