//! Round-trip counts, store failures and index drift.

use entikv_core::{Collection, CollectionConfig, CoreError, KeyValueStore, Patch, SecondaryIndex};
use entikv_storage::{SetOptions, StorageError};
use entikv_testkit::prelude::*;
use std::sync::Arc;

fn faulty_customers() -> (
    Arc<FaultyStore>,
    Collection<Customer>,
    SecondaryIndex<Customer>,
) {
    let store = Arc::new(FaultyStore::new());
    let (coll, index) = customers(store.clone(), CollectionConfig::new());
    (store, coll, index)
}

#[tokio::test]
async fn reads_take_one_round_trip() {
    let (store, coll, _) = faulty_customers();
    coll.set(&customer("c1", "s1")).await.unwrap();
    coll.set(&customer("c2", "s2")).await.unwrap();
    let before = store.round_trips();

    coll.get("c1").await.unwrap();
    assert_eq!(store.round_trips(), before + 1);

    let found = coll.get_many(&["c1", "c2", "c3"]).await.unwrap();
    assert_eq!(found.iter().flatten().count(), 2);
    assert_eq!(store.round_trips(), before + 2);

    let none: [&str; 0] = [];
    assert!(coll.get_many(&none).await.unwrap().is_empty());
    assert_eq!(store.round_trips(), before + 2);
}

#[tokio::test]
async fn indexed_write_is_write_plus_one_pipeline() {
    let (store, coll, _) = faulty_customers();
    coll.set(&customer("c1", "s1")).await.unwrap();
    assert_eq!(store.round_trips(), 2);

    // unchanged index value still refreshes membership in one pipeline
    coll.set(&customer("c1", "s1")).await.unwrap();
    assert_eq!(store.round_trips(), 4);
}

#[tokio::test]
async fn failed_pipeline_leaves_record_written() {
    let (store, coll, by_stripe) = faulty_customers();
    store.fail_pipelines(true);

    let err = coll.set(&customer("c1", "s1")).await.unwrap_err();
    assert!(matches!(err, CoreError::Storage(StorageError::Connection(_))));

    // the primary write happened before the pipeline
    assert_eq!(coll.get("c1").await.unwrap(), Some(customer("c1", "s1")));
    assert!(by_stripe.get_ids("s1").await.unwrap().is_empty());

    // the next successful write repairs the membership
    store.fail_pipelines(false);
    coll.set(&customer("c1", "s1")).await.unwrap();
    assert_eq!(by_stripe.get_ids("s1").await.unwrap(), vec!["c1"]);
}

#[tokio::test]
async fn failed_write_touches_nothing() {
    let (store, coll, by_stripe) = faulty_customers();
    store.fail_writes(true);

    assert!(coll.set(&customer("c1", "s1")).await.is_err());
    assert!(store.inner().is_empty());
    store.fail_writes(false);
    assert!(by_stripe.get_ids("s1").await.unwrap().is_empty());
}

#[tokio::test]
async fn read_failures_propagate() {
    let (store, coll, by_stripe) = faulty_customers();
    coll.set(&customer("c1", "s1")).await.unwrap();
    store.fail_reads(true);

    assert!(matches!(
        coll.get("c1").await,
        Err(CoreError::Storage(_))
    ));
    assert!(coll.get_many(&["c1"]).await.is_err());
    assert!(by_stripe.get_items("s1").await.is_err());
    assert!(matches!(
        coll.update("c1", Patch::new()).await,
        Err(CoreError::Storage(_))
    ));
}

#[tokio::test]
async fn stale_ids_are_filtered() {
    let (_store, coll, by_stripe) = faulty_customers();
    coll.set(&customer("c1", "s1")).await.unwrap();
    coll.set(&customer("c2", "s1")).await.unwrap();
    coll.delete("c1").await.unwrap();

    assert_eq!(by_stripe.get_ids("s1").await.unwrap(), vec!["c1", "c2"]);
    assert_eq!(
        by_stripe.get_items("s1").await.unwrap(),
        vec![customer("c2", "s1")]
    );

    coll.purge("c2").await.unwrap();
    assert_eq!(by_stripe.get_ids("s1").await.unwrap(), vec!["c1"]);
    assert!(by_stripe.get_items("s1").await.unwrap().is_empty());
}

#[tokio::test]
async fn undecodable_member_fails_lookup() {
    let (store, coll, by_stripe) = faulty_customers();
    coll.set(&customer("c1", "s1")).await.unwrap();
    store
        .inner()
        .set("customersc1", "{broken".into(), SetOptions::new())
        .await
        .unwrap();

    assert!(by_stripe.get_items("s1").await.unwrap_err().is_decode());
    let outcomes = coll.try_get_many(&["c1"]).await.unwrap();
    assert!(outcomes[0].as_ref().is_err_and(|e| e.is_decode()));
}
