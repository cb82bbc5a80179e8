// tests/metrics.rs
//
// The Prometheus recorder is process-global, so this file holds a single test.
mod common;

use std::sync::Arc;

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use common::{orchestrator, scenario_items, FakeSource};
use hn_insights::api::{self, AppState};
use hn_insights::metrics::Metrics;

#[tokio::test]
async fn metrics_endpoint_contains_expected_series() {
    let metrics = Metrics::init(300).expect("install recorder");
    let (orch, _clock) = orchestrator(Arc::new(FakeSource::with_items(scenario_items())));
    let app = api::router(AppState::new(orch)).merge(metrics.router());

    // One miss, then one hit.
    for _ in 0..2 {
        let resp = app
            .clone()
            .oneshot(Request::get("/v0/stories").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = app
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    for needle in [
        "snapshot_cache_hits_total",
        "snapshot_cache_misses_total",
        "snapshot_refresh_total",
        "snapshot_refresh_ms",
        "snapshot_cache_ttl_secs 300",
        "ingest_items_fetched_total",
    ] {
        assert!(text.contains(needle), "missing {needle} in:\n{text}");
    }
}
