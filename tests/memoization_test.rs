//! Integration tests for memoized service calls.

mod common;

use cloud_auditor::adapters::memo::MemoRegistry;
use cloud_auditor::domain::models::MemoConfig;
use cloud_auditor::domain::ports::ServiceRequest;
use cloud_auditor::AuditError;
use common::{OtherStubClient, StubClient};
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn describe_buckets() -> ServiceRequest {
    ServiceRequest::new("ListBuckets", json!({"MaxResults": 50}))
}

#[tokio::test]
async fn test_identical_calls_reach_service_once() {
    let memo = MemoRegistry::default();
    let client = Arc::new(StubClient::new().respond("ListBuckets", json!({"Buckets": ["a"]})));
    let memoized = memo.memo(Arc::clone(&client));

    let first = memoized.send(&describe_buckets()).await.unwrap();
    let second = memoized.send(&describe_buckets()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn test_argument_key_order_does_not_change_identity() {
    let memo = MemoRegistry::default();
    let client = Arc::new(StubClient::new());
    let memoized = memo.memo(Arc::clone(&client));

    memoized
        .send(&ServiceRequest::new("DescribeVolumes", json!({"a": 1, "b": [1, 2]})))
        .await
        .unwrap();
    memoized
        .send(&ServiceRequest::new("DescribeVolumes", json!({"b": [1, 2], "a": 1})))
        .await
        .unwrap();

    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn test_different_arguments_are_distinct_calls() {
    let memo = MemoRegistry::default();
    let client = Arc::new(StubClient::new());
    let memoized = memo.memo(Arc::clone(&client));

    let east = memoized
        .send(&ServiceRequest::new("DescribeRegions", json!({"region": "us-east-1"})))
        .await
        .unwrap();
    let west = memoized
        .send(&ServiceRequest::new("DescribeRegions", json!({"region": "us-west-2"})))
        .await
        .unwrap();
    memoized
        .send(&ServiceRequest::new("DescribeZones", json!({"region": "us-east-1"})))
        .await
        .unwrap();

    assert_ne!(east, west);
    assert_eq!(client.call_count(), 3);
}

#[tokio::test]
async fn test_clients_are_isolated_by_identity() {
    let memo = MemoRegistry::default();
    let stub = Arc::new(StubClient::new());
    let other = Arc::new(OtherStubClient::new());

    memo.memo(Arc::clone(&stub))
        .send(&describe_buckets())
        .await
        .unwrap();
    let response = memo
        .memo(Arc::clone(&other))
        .send(&describe_buckets())
        .await
        .unwrap();

    assert_eq!(*response, json!({"from": "other"}));
    assert_eq!(stub.call_count(), 1);
    assert_eq!(other.calls.load(Ordering::SeqCst), 1);
    assert_eq!(memo.len(), 2);
}

#[tokio::test]
async fn test_same_client_type_shares_cache_across_wrappers() {
    let memo = MemoRegistry::default();
    let first_client = Arc::new(StubClient::new());
    let second_client = Arc::new(StubClient::new());

    // two rules each wrapping their own instance of the same client type
    let rule_a = memo.memo(Arc::clone(&first_client));
    let rule_b = memo.memo(Arc::clone(&second_client));

    rule_a.send(&describe_buckets()).await.unwrap();
    rule_b.send(&describe_buckets()).await.unwrap();

    assert_eq!(first_client.call_count(), 1);
    assert_eq!(second_client.call_count(), 0);
    assert!(Arc::ptr_eq(rule_a.memoizer(), rule_b.memoizer()));
}

#[tokio::test]
async fn test_reset_clears_responses_but_keeps_memoizers() {
    let memo = MemoRegistry::default();
    let client = Arc::new(StubClient::new());
    let memoized = memo.memo(Arc::clone(&client));

    memoized.send(&describe_buckets()).await.unwrap();
    assert!(memoized.memoizer().contains(&describe_buckets()));

    memo.reset().await;
    assert_eq!(memo.len(), 1);
    assert!(!memoized.memoizer().contains(&describe_buckets()));

    memoized.send(&describe_buckets()).await.unwrap();
    assert_eq!(client.call_count(), 2);
}

#[tokio::test]
async fn test_failed_calls_are_not_cached() {
    let memo = MemoRegistry::default();
    let client = Arc::new(StubClient::new());
    let memoized = memo.memo(Arc::clone(&client));

    client.fail("ListBuckets");
    let err = memoized.send(&describe_buckets()).await.unwrap_err();
    assert!(matches!(err, AuditError::ClientCall { ref operation, .. } if operation == "ListBuckets"));

    client.recover("ListBuckets");
    memoized.send(&describe_buckets()).await.unwrap();
    memoized.send(&describe_buckets()).await.unwrap();

    assert_eq!(client.call_count(), 2);
}

#[tokio::test]
async fn test_concurrent_identical_reads_are_coalesced() {
    let memo = MemoRegistry::default();
    let client = Arc::new(StubClient::new().with_delay(Duration::from_millis(50)));
    let memoized = memo.memo(Arc::clone(&client));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let memoized = memoized.clone();
        handles.push(tokio::spawn(async move {
            memoized.send(&describe_buckets()).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(client.call_count(), 1);
    let stats = memoized.memoizer().stats().await;
    assert_eq!(stats.requests, 8);
    assert_eq!(stats.upstream_calls, 1);
    assert_eq!(stats.entries, 1);
}

#[tokio::test]
async fn test_uncoalesced_reads_still_settle_on_one_entry() {
    let memo = MemoRegistry::new(MemoConfig {
        coalesce_in_flight: false,
        ..MemoConfig::default()
    });
    let client = Arc::new(StubClient::new().with_delay(Duration::from_millis(20)));
    let memoized = memo.memo(Arc::clone(&client));

    let (req_a, req_b) = (describe_buckets(), describe_buckets());
    let (a, b) = tokio::join!(memoized.send(&req_a), memoized.send(&req_b));
    assert_eq!(a.unwrap(), b.unwrap());
    let racing_calls = client.call_count();
    assert!((1..=2).contains(&racing_calls));

    memoized.send(&describe_buckets()).await.unwrap();
    assert_eq!(client.call_count(), racing_calls);
}

#[tokio::test]
async fn test_send_as_deserializes_response() {
    #[derive(Debug, Deserialize)]
    struct Buckets {
        #[serde(rename = "Buckets")]
        buckets: Vec<String>,
    }

    let memo = MemoRegistry::default();
    let client = Arc::new(
        StubClient::new().respond("ListBuckets", json!({"Buckets": ["logs", "backups"]})),
    );
    let memoized = memo.memo(client);

    let parsed: Buckets = memoized.send_as(&describe_buckets()).await.unwrap();
    assert_eq!(parsed.buckets, vec!["logs", "backups"]);

    let mismatch: Result<Vec<u32>, _> = memoized.send_as(&describe_buckets()).await;
    assert!(matches!(mismatch, Err(AuditError::ClientCall { .. })));
}

#[tokio::test]
async fn test_uncached_calls_always_execute() {
    let memo = MemoRegistry::default();
    let client = Arc::new(StubClient::new());
    let memoized = memo.memo(Arc::clone(&client));

    let request = ServiceRequest::new("PutBucketVersioning", json!({"Bucket": "logs"}));
    memoized.send_uncached(&request).await.unwrap();
    memoized.send_uncached(&request).await.unwrap();

    assert_eq!(client.calls_to("PutBucketVersioning"), 2);
    assert!(!memoized.memoizer().contains(&request));
}
