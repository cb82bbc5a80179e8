// tests/ingest_batch.rs
mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{item, FakeSource};
use hn_insights::ingest::fetch_ranked_items;
use hn_insights::TransportError;

#[tokio::test]
async fn ranked_order_survives_reversed_completion_order() {
    let items: Vec<_> = (1..=8)
        .map(|id| item(id, &format!("story {id}"), None, id, 0))
        .collect();
    let src = FakeSource::with_items(items);
    // Earlier ranks finish last.
    for id in 1..=8u64 {
        src.set_delay(id, Duration::from_millis(5 * (9 - id)));
    }

    let out = fetch_ranked_items(&src, 50, 8).await.expect("batch ok");
    let ids: Vec<u64> = out.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7, 8]);
}

#[tokio::test]
async fn concurrency_is_bounded() {
    let items: Vec<_> = (1..=12).map(|id| item(id, "t", None, 0, 0)).collect();
    let src = FakeSource::with_items(items);
    for id in 1..=12u64 {
        src.set_delay(id, Duration::from_millis(10));
    }

    let out = fetch_ranked_items(&src, 50, 3).await.unwrap();
    assert_eq!(out.len(), 12);
    let max = src.max_in_flight.load(Ordering::SeqCst);
    assert!(max <= 3, "at most 3 fetches in flight, saw {max}");
    assert!(max >= 2, "fetches should overlap, saw {max}");
}

#[tokio::test]
async fn one_failing_item_fails_the_whole_batch() {
    let items: Vec<_> = (1..=5).map(|id| item(id, "t", None, 0, 0)).collect();
    let src = FakeSource::with_items(items);
    src.fail_item(Some(4));

    let err = fetch_ranked_items(&src, 50, 2).await.unwrap_err();
    assert!(matches!(err, TransportError::Request { .. }), "got {err:?}");
}

#[tokio::test]
async fn missing_items_default_and_do_not_abort() {
    let src = FakeSource::with_items(vec![item(1, "known", Some("http://a.com"), 9, 9)]);
    src.set_ids(vec![1, 77]);

    let out = fetch_ranked_items(&src, 50, 4).await.unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[1].id, 77);
    assert_eq!(out[1].title, "");
    assert_eq!(out[1].score, 0);
    assert_eq!(out[1].descendants, 0);
    assert_eq!(out[1].by, "");
    assert!(out[1].url.is_none());
}

#[tokio::test]
async fn empty_ranking_is_an_empty_batch() {
    let src = FakeSource::default();
    let out = fetch_ranked_items(&src, 50, 4).await.unwrap();
    assert!(out.is_empty());
    assert_eq!(src.item_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn duplicate_ids_are_fetched_once_and_limit_applies() {
    let items: Vec<_> = (1..=6).map(|id| item(id, "t", None, 0, 0)).collect();
    let src = FakeSource::with_items(items);
    src.set_ids(vec![3, 3, 1, 2, 1, 4, 5, 6]);

    let out = fetch_ranked_items(&src, 4, 4).await.unwrap();
    let ids: Vec<u64> = out.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![3, 1, 2]);
    assert_eq!(src.item_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn ranked_failure_skips_item_fetches() {
    let src = FakeSource::with_items(vec![item(1, "t", None, 0, 0)]);
    src.fail_ranked(true);

    let err = fetch_ranked_items(&src, 50, 4).await.unwrap_err();
    assert!(matches!(err, TransportError::Status { status: 503, .. }));
    assert_eq!(src.item_calls.load(Ordering::SeqCst), 0);
}
