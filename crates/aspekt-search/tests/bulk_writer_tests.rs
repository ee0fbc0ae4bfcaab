//! Bulk writer pipeline against the in-memory index.

#![allow(clippy::unwrap_used)]

mod common;

use aspekt_core::Error;
use aspekt_search::{
    BulkConfig, DocumentState, FailureKind, InMemoryIndex, ItemFailure, ItemOutcome,
};
use common::{INDEX, dataset_document, document, writer};
use serde_json::json;
use std::time::Duration;

const ORDERS: &str = "urn:li:dataset:orders";

fn unbatched() -> BulkConfig {
    BulkConfig {
        bulk_actions: 1,
        concurrent_requests: 1,
        flush_interval_ms: None,
    }
}

#[tokio::test]
async fn test_second_upsert_replaces_whole_document() {
    let schema = dataset_document();
    let index = InMemoryIndex::new();
    let (writer, _) = writer(&index, BulkConfig::default());

    let first = document(&schema, ORDERS, Some("orders"), Some("every order"), &["pii"]);
    let second = document(&schema, ORDERS, Some("orders_v2"), None, &[]);
    writer.upsert(&first, ORDERS).unwrap();
    writer.upsert(&second, ORDERS).unwrap();
    writer.close().await.unwrap();

    let stored = index.get(INDEX, ORDERS).unwrap();
    assert_eq!(stored.source, json!({"urn": ORDERS, "name": "orders_v2"}));
    assert_eq!(stored.version, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_serial_batches_keep_the_last_upsert() {
    let schema = dataset_document();
    let index = InMemoryIndex::new();
    let (writer, _) = writer(&index, unbatched());

    for seq in 0..50 {
        let name = seq.to_string();
        writer
            .upsert(&document(&schema, ORDERS, Some(&name), None, &[]), ORDERS)
            .unwrap();
    }
    let stats = writer.close().await.unwrap();

    assert_eq!(stats.batches, 50);
    let stored = index.get(INDEX, ORDERS).unwrap();
    assert_eq!(stored.source, json!({"urn": ORDERS, "name": "49"}));
    assert_eq!(stored.version, 50);
}

#[tokio::test]
async fn test_conflicts_within_retry_budget_commit() {
    let schema = dataset_document();
    let index = InMemoryIndex::new();
    index.inject_conflicts(INDEX, ORDERS, 3);
    let (writer, listener) = writer(&index, unbatched());

    writer
        .upsert(&document(&schema, ORDERS, Some("orders"), None, &[]), ORDERS)
        .unwrap();
    let stats = writer.close().await.unwrap();

    assert_eq!(stats.committed, 1);
    assert_eq!(stats.failed, 0);
    assert_eq!(writer.state(ORDERS), Some(DocumentState::Committed));
    assert_eq!(listener.outcome(ORDERS), Some(ItemOutcome::Created));
}

#[tokio::test]
async fn test_exhausted_retries_are_reported() {
    let schema = dataset_document();
    let index = InMemoryIndex::new();
    index.inject_conflicts(INDEX, ORDERS, 4);
    let (writer, listener) = writer(&index, unbatched());

    writer
        .upsert(&document(&schema, ORDERS, Some("orders"), None, &[]), ORDERS)
        .unwrap();
    writer
        .upsert(&document(&schema, "urn:li:dataset:users", None, None, &[]), "urn:li:dataset:users")
        .unwrap();
    let stats = writer.close().await.unwrap();

    assert_eq!(stats.failed, 1);
    assert_eq!(stats.committed, 1);
    assert_eq!(writer.state(ORDERS), Some(DocumentState::Failed));
    assert_eq!(listener.failed_ids(), vec![ORDERS.to_string()]);
    assert!(matches!(
        listener.outcome(ORDERS),
        Some(ItemOutcome::Failed(ItemFailure {
            kind: FailureKind::Conflict,
            ..
        }))
    ));
    assert!(index.get(INDEX, ORDERS).is_none());
}

#[tokio::test]
async fn test_upsert_then_delete() {
    let schema = dataset_document();
    let index = InMemoryIndex::new();
    let (writer, listener) = writer(&index, BulkConfig::default());

    writer
        .upsert(&document(&schema, ORDERS, Some("orders"), None, &[]), ORDERS)
        .unwrap();
    writer.delete(ORDERS).unwrap();
    writer.delete("urn:li:dataset:never").unwrap();
    let stats = writer.close().await.unwrap();

    assert_eq!(stats.committed, 3);
    assert!(index.is_empty());
    assert_eq!(listener.outcome(ORDERS), Some(ItemOutcome::Deleted));
    assert_eq!(
        listener.outcome("urn:li:dataset:never"),
        Some(ItemOutcome::NotFound)
    );
}

#[tokio::test]
async fn test_transport_outage_reaches_listener() {
    let schema = dataset_document();
    let index = InMemoryIndex::new();
    index.fail_transport(true);
    let (writer, listener) = writer(&index, BulkConfig::default());

    writer
        .upsert(&document(&schema, ORDERS, None, None, &[]), ORDERS)
        .unwrap();
    let stats = writer.close().await.unwrap();

    assert_eq!(stats.failed, 1);
    assert_eq!(listener.failed_ids(), vec![ORDERS.to_string()]);
    assert_eq!(writer.state(ORDERS), Some(DocumentState::Failed));
}

#[tokio::test]
async fn test_staging_after_close_fails() {
    let schema = dataset_document();
    let index = InMemoryIndex::new();
    let (writer, _) = writer(&index, BulkConfig::default());
    writer.close().await.unwrap();

    let err = writer
        .upsert(&document(&schema, ORDERS, None, None, &[]), ORDERS)
        .unwrap_err();
    assert!(matches!(err, Error::Closed { .. }));
    assert!(matches!(writer.delete(ORDERS), Err(Error::Closed { .. })));
    assert!(matches!(writer.close().await, Err(Error::Closed { .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_upserts_from_many_threads() {
    let schema = dataset_document();
    let index = InMemoryIndex::new();
    let (writer, _) = writer(
        &index,
        BulkConfig {
            bulk_actions: 7,
            concurrent_requests: 3,
            flush_interval_ms: Some(5),
        },
    );

    std::thread::scope(|scope| {
        for thread in 0..8 {
            let writer = &writer;
            let schema = &schema;
            scope.spawn(move || {
                for n in 0..25 {
                    let id = format!("urn:li:dataset:t{thread}_{n}");
                    let doc = document(schema, &id, Some("table"), None, &[]);
                    writer.upsert(&doc, &id).unwrap();
                }
            });
        }
    });
    let stats = tokio::time::timeout(Duration::from_secs(30), writer.close())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(stats.submitted, 200);
    assert_eq!(stats.committed, 200);
    assert_eq!(index.len(), 200);
}

#[tokio::test]
async fn test_racing_upserts_of_one_id_converge_to_a_full_document() {
    let schema = dataset_document();
    let index = InMemoryIndex::new();
    let (writer, _) = writer(
        &index,
        BulkConfig {
            bulk_actions: 1,
            concurrent_requests: 4,
            flush_interval_ms: None,
        },
    );
    let names = ["a", "b", "c", "d"];

    for name in names {
        writer
            .upsert(&document(&schema, ORDERS, Some(name), None, &[]), ORDERS)
            .unwrap();
    }
    writer.close().await.unwrap();

    let stored = index.get(INDEX, ORDERS).unwrap();
    let name = stored.source["name"].as_str().unwrap();
    assert!(names.contains(&name));
    assert_eq!(stored.source.as_object().unwrap().len(), 2);
    assert_eq!(stored.version, 4);
}
