//! Integration tests for the DocumentDB backend against a local container
//!
//! Run with: cargo test --test documentdb_integration -- --ignored --nocapture
//!
//! Requires a local MongoDB/DocumentDB instance, e.g.:
//!   docker run -dt -p 27017:27017 --name statestore-mongo mongo:7

use serde_json::json;
use statestore::{
    DocumentDbConfig, DocumentDbStateStore, StateStorage, StateStorageExt, StoreError, StoreItem,
};
use uuid::Uuid;

const TEST_URL: &str = "mongodb://localhost:27017";
const TEST_DB: &str = "test_statestore";

async fn test_store() -> DocumentDbStateStore {
    // Fresh collection per test so runs never interfere
    let collection = format!("state_items_{}", Uuid::new_v4().simple());
    DocumentDbStateStore::new(DocumentDbConfig::new(TEST_URL, TEST_DB, collection))
        .await
        .expect("Failed to create store")
}

#[tokio::test]
#[ignore] // Requires MongoDB instance
async fn test_documentdb_connection() {
    let store = test_store().await;
    assert!(store.is_available().await, "store should answer ping");
}

#[tokio::test]
#[ignore] // Requires MongoDB instance
async fn test_documentdb_round_trip_with_sanitized_key() {
    let store = test_store().await;
    let key = "conversation/user#1 state";
    let value = json!({"turn": 3, "topic": "weather"});

    store.write_one(key, StoreItem::new(value.clone())).await.unwrap();

    let items = store.read(&[key.to_string()]).await.unwrap();
    assert_eq!(items.len(), 1);
    // Keyed by the original, unsanitized key
    let item = &items[key];
    assert_eq!(item.value, value);
    assert!(item.concurrency_token.is_some());

    store.delete(&[key.to_string()]).await.unwrap();
    let items = store.read(&[key.to_string()]).await.unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
#[ignore] // Requires MongoDB instance
async fn test_documentdb_conditional_write_conflict() {
    let store = test_store().await;
    let key = "conflict-key";

    store.write_one(key, StoreItem::new(json!({"n": 1}))).await.unwrap();
    let stale = store
        .read_one(key)
        .await
        .unwrap()
        .unwrap()
        .concurrency_token
        .unwrap();

    // Intervening write bumps the stored revision
    store.write_one(key, StoreItem::new(json!({"n": 2}))).await.unwrap();

    let err = store
        .write_one(key, StoreItem::with_token(json!({"n": 3}), stale))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ConcurrencyConflict { .. }));

    // Current token still works
    let current = store
        .read_one(key)
        .await
        .unwrap()
        .unwrap()
        .concurrency_token
        .unwrap();
    store
        .write_one(key, StoreItem::with_token(json!({"n": 3}), current))
        .await
        .unwrap();
}

#[tokio::test]
#[ignore] // Requires MongoDB instance
async fn test_documentdb_batch_read_selectivity() {
    let store = test_store().await;
    store.write_one("k1", StoreItem::new(json!(1))).await.unwrap();
    store.write_one("k3", StoreItem::new(json!(3))).await.unwrap();

    let keys = vec!["k1".to_string(), "k2".to_string(), "k3".to_string()];
    let items = store.read(&keys).await.unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.contains_key("k1"));
    assert!(items.contains_key("k3"));
}

#[tokio::test]
#[ignore] // Requires MongoDB instance
async fn test_documentdb_read_drains_all_result_batches() {
    let store = test_store().await;

    // More documents than the driver returns in one batch (default first
    // batch is 101), so the read has to follow the cursor to completion.
    let count = 200;
    for i in 0..count {
        store
            .write_one(&format!("bulk/key {i}"), StoreItem::new(json!({"i": i})))
            .await
            .unwrap();
    }

    let keys: Vec<String> = (0..count).map(|i| format!("bulk/key {i}")).collect();
    let items = store.read(&keys).await.unwrap();
    assert_eq!(items.len(), count);
    for i in 0..count {
        assert_eq!(items[&format!("bulk/key {i}")].value, json!({"i": i}));
    }
}

#[tokio::test]
#[ignore] // Requires MongoDB instance
async fn test_documentdb_delete_absent_key_succeeds() {
    let store = test_store().await;
    store.delete(&["never-written".to_string()]).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires MongoDB instance
async fn test_documentdb_concurrent_first_calls_share_provisioning() {
    use std::sync::Arc;

    let store = Arc::new(test_store().await);

    // Hammer the unprovisioned store from many tasks at once; every call
    // must succeed and observe the same collection.
    let mut handles = Vec::new();
    for i in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .write_one(&format!("k{i}"), StoreItem::new(json!(i)))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let keys: Vec<String> = (0..8).map(|i| format!("k{i}")).collect();
    let items = store.read(&keys).await.unwrap();
    assert_eq!(items.len(), 8);
}
