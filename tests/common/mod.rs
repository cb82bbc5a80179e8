// tests/common/mod.rs
// In-memory item source shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use hn_insights::cache::{ManualClock, SnapshotCache};
use hn_insights::enrich::ItemEnricher;
use hn_insights::ingest::types::{ItemSource, RawItem};
use hn_insights::orchestrator::{RefreshOrchestrator, Settings};
use hn_insights::TransportError;

pub fn item(id: u64, title: &str, url: Option<&str>, score: u64, descendants: u64) -> RawItem {
    RawItem {
        id,
        title: title.to_string(),
        url: url.map(str::to_string),
        time: 1_700_000_000 + id as i64,
        score,
        descendants,
        by: format!("user{id}"),
    }
}

/// The three-story fixture used across the scenario tests.
pub fn scenario_items() -> Vec<RawItem> {
    vec![
        item(101, "New ChatGPT release", Some("http://a.com/x"), 120, 40),
        item(102, "Rust and LLM tools", Some("http://b.com/y"), 80, 12),
        item(103, "Weather today", Some(""), 5, 0),
    ]
}

#[derive(Default)]
pub struct FakeSource {
    ids: Mutex<Vec<u64>>,
    items: Mutex<HashMap<u64, RawItem>>,
    delays: Mutex<HashMap<u64, Duration>>,
    failing_item: Mutex<Option<u64>>,
    fail_ranked: AtomicBool,
    pub ranked_calls: AtomicUsize,
    pub item_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeSource {
    pub fn with_items(items: Vec<RawItem>) -> Self {
        let src = Self::default();
        src.set_items(items);
        src
    }

    /// Ranked order = order of `items`.
    pub fn set_items(&self, items: Vec<RawItem>) {
        *self.ids.lock().unwrap() = items.iter().map(|i| i.id).collect();
        *self.items.lock().unwrap() = items.into_iter().map(|i| (i.id, i)).collect();
    }

    /// Override the ranked id list (ids without an item resolve to defaults).
    pub fn set_ids(&self, ids: Vec<u64>) {
        *self.ids.lock().unwrap() = ids;
    }

    pub fn set_delay(&self, id: u64, d: Duration) {
        self.delays.lock().unwrap().insert(id, d);
    }

    pub fn fail_item(&self, id: Option<u64>) {
        *self.failing_item.lock().unwrap() = id;
    }

    pub fn fail_ranked(&self, on: bool) {
        self.fail_ranked.store(on, Ordering::SeqCst);
    }
}

#[async_trait]
impl ItemSource for FakeSource {
    async fn fetch_ranked_ids(&self, limit: usize) -> Result<Vec<u64>, TransportError> {
        self.ranked_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_ranked.load(Ordering::SeqCst) {
            return Err(TransportError::Status {
                url: "fake://topstories.json".into(),
                status: 503,
            });
        }
        let mut ids = self.ids.lock().unwrap().clone();
        ids.truncate(limit);
        Ok(ids)
    }

    async fn fetch_item(&self, id: u64) -> Result<RawItem, TransportError> {
        self.item_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.delays.lock().unwrap().get(&id).copied();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if *self.failing_item.lock().unwrap() == Some(id) {
            return Err(TransportError::Request {
                url: format!("fake://item/{id}.json"),
                reason: "connection reset".into(),
            });
        }
        let found = self.items.lock().unwrap().get(&id).cloned();
        Ok(found.unwrap_or(RawItem {
            id,
            ..RawItem::default()
        }))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub fn start() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
}

/// Orchestrator over `source` with a hand-driven clock and default settings.
pub fn orchestrator(source: Arc<FakeSource>) -> (Arc<RefreshOrchestrator>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start()));
    let orch = RefreshOrchestrator::new(
        source,
        ItemEnricher::default(),
        SnapshotCache::new(clock.clone()),
        Settings::default(),
    );
    (Arc::new(orch), clock)
}
