// src/cache.rs
//! # Snapshot Cache
//! TTL cache of the last computed [`Snapshot`] per key, with single-flight
//! refresh.
//!
//! An entry is live while `now < captured_at + ttl` (absolute TTL, no sliding
//! refresh). When no live entry exists, the first caller starts the refresh
//! on a detached tokio task; every caller arriving while that task runs
//! attaches to the same shared result. A failed refresh writes nothing, so
//! the previous entry (if any) is left exactly as it was.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use metrics::{counter, histogram};

use crate::error::TransportError;
use crate::snapshot::Snapshot;

pub type SnapshotResult = Result<Arc<Snapshot>, TransportError>;

type InFlight = Shared<BoxFuture<'static, SnapshotResult>>;

/// Source of wall-clock time for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += chrono::Duration::from_std(by).unwrap_or(chrono::Duration::MAX);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A snapshot together with the instant it stops being served.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub snapshot: Arc<Snapshot>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(snapshot: Arc<Snapshot>, ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let expires_at = snapshot
            .captured_at()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            snapshot,
            expires_at,
        }
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Observable lifecycle of one cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CacheState {
    Empty,
    Fetching,
    Populated,
    Stale,
}

#[derive(Default)]
struct Slot {
    entry: Option<CacheEntry>,
    in_flight: Option<InFlight>,
}

type Slots = Arc<Mutex<HashMap<String, Slot>>>;

// Slots are only ever left in a consistent state, so a poisoned lock (a
// refresh closure that panicked while it was held) is safe to reuse.
fn lock_slots(slots: &Mutex<HashMap<String, Slot>>) -> MutexGuard<'_, HashMap<String, Slot>> {
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the in-flight marker if the refresh task ends without reaching its
/// normal completion path (panic, runtime shutdown).
struct FlightGuard {
    slots: Slots,
    key: String,
    armed: bool,
}

impl FlightGuard {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(slot) = lock_slots(&self.slots).get_mut(&self.key) {
            slot.in_flight = None;
        }
        counter!("snapshot_refresh_errors_total").increment(1);
        tracing::debug!(target: "cache", key = %self.key, "refresh task ended abnormally; key released");
    }
}

/// Keyed snapshot cache. Cloning shares the underlying storage.
#[derive(Clone)]
pub struct SnapshotCache {
    slots: Slots,
    clock: Arc<dyn Clock>,
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl SnapshotCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Return the live snapshot for `key`, or refresh it exactly once for all
    /// concurrent callers.
    ///
    /// `refresh` is only called (and its future only spawned) when this call
    /// starts a new flight. Dropping the returned future stops the wait, not
    /// the refresh. Must be called from within a tokio runtime.
    pub async fn get_or_refresh<F, Fut>(&self, key: &str, ttl: Duration, refresh: F) -> SnapshotResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Snapshot, TransportError>> + Send + 'static,
    {
        let flight = {
            let mut slots = lock_slots(&self.slots);
            let slot = slots.entry(key.to_string()).or_default();

            if let Some(entry) = slot.entry.as_ref().filter(|e| e.is_live(self.clock.now())) {
                counter!("snapshot_cache_hits_total").increment(1);
                tracing::trace!(target: "cache", key, "hit");
                return Ok(entry.snapshot.clone());
            }

            if let Some(flight) = slot.in_flight.clone() {
                counter!("snapshot_cache_joins_total").increment(1);
                tracing::trace!(target: "cache", key, "joining in-flight refresh");
                flight
            } else {
                counter!("snapshot_cache_misses_total").increment(1);
                tracing::debug!(
                    target: "cache",
                    key,
                    stale = slot.entry.is_some(),
                    "miss; starting refresh"
                );
                let flight = self.start_flight(key.to_string(), ttl, refresh());
                slot.in_flight = Some(flight.clone());
                flight
            }
        };

        flight.await
    }

    /// Spawn the refresh and wrap its join handle in a shareable future.
    ///
    /// Called with the slot map locked; the spawned task takes the same lock
    /// when it finishes, so `in_flight` is always installed before it is
    /// cleared. `FlightGuard` clears it when the task panics or is dropped.
    fn start_flight<Fut>(&self, key: String, ttl: Duration, fut: Fut) -> InFlight
    where
        Fut: Future<Output = Result<Snapshot, TransportError>> + Send + 'static,
    {
        let slots = Arc::clone(&self.slots);
        let handle = tokio::spawn(async move {
            let guard = FlightGuard {
                slots: Arc::clone(&slots),
                key: key.clone(),
                armed: true,
            };
            let t0 = Instant::now();
            let res = fut.await.map(Arc::new);
            histogram!("snapshot_refresh_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
            counter!("snapshot_refresh_total").increment(1);

            let mut map = lock_slots(&slots);
            let slot = map.entry(key.clone()).or_default();
            slot.in_flight = None;
            match &res {
                Ok(snapshot) => {
                    slot.entry = Some(CacheEntry::new(Arc::clone(snapshot), ttl));
                    tracing::debug!(target: "cache", key = %key, items = snapshot.len(), "stored");
                }
                Err(e) => {
                    counter!("snapshot_refresh_errors_total").increment(1);
                    tracing::debug!(target: "cache", key = %key, error = %e, "refresh failed; entry untouched");
                }
            }
            drop(map);
            guard.disarm();
            res
        });

        handle
            .map(|joined| {
                joined.unwrap_or_else(|e| {
                    Err(TransportError::Aborted {
                        reason: e.to_string(),
                    })
                })
            })
            .boxed()
            .shared()
    }

    /// Current entry for `key`, live or not, without refreshing.
    pub fn peek(&self, key: &str) -> Option<CacheEntry> {
        let slots = lock_slots(&self.slots);
        slots.get(key).and_then(|s| s.entry.clone())
    }

    pub fn state(&self, key: &str) -> CacheState {
        let slots = lock_slots(&self.slots);
        match slots.get(key) {
            None => CacheState::Empty,
            Some(slot) if slot.in_flight.is_some() => CacheState::Fetching,
            Some(Slot { entry: None, .. }) => CacheState::Empty,
            Some(Slot {
                entry: Some(e), ..
            }) => {
                if e.is_live(self.clock.now()) {
                    CacheState::Populated
                } else {
                    CacheState::Stale
                }
            }
        }
    }

    /// Drop the stored entry. An in-flight refresh is not affected and will
    /// store its result when it completes.
    pub fn invalidate(&self, key: &str) {
        let mut slots = lock_slots(&self.slots);
        if let Some(slot) = slots.get_mut(key) {
            slot.entry = None;
        }
    }
}
