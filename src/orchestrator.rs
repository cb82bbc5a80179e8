// src/orchestrator.rs
//! Snapshot entry point shared by the query surface and the scheduler.
//!
//! Per cache key: `Empty -> Fetching -> Populated`, `Populated -> Stale ->
//! Fetching`. A failed fetch leaves the key in whatever state it had before
//! (`Empty` or `Stale`), because the cache never writes a failed result.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::analytics::{self, Insights};
use crate::cache::{CacheState, SnapshotCache, SnapshotResult};
use crate::config::InsightsConfig;
use crate::enrich::ItemEnricher;
use crate::ingest::{self, types::ItemSource};
use crate::snapshot::Snapshot;

/// The one ranking this service tracks.
pub const TOP_STORIES_KEY: &str = "top_stories";

/// Knobs the orchestrator and the analytic views run with.
#[derive(Debug, Clone)]
pub struct Settings {
    pub fetch_limit: usize,
    pub fetch_concurrency: usize,
    pub ttl: Duration,
    pub top_n: usize,
    pub min_word_len: usize,
    pub stop_words: HashSet<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&InsightsConfig::default())
    }
}

impl Settings {
    pub fn from_config(cfg: &InsightsConfig) -> Self {
        Self {
            fetch_limit: cfg.fetch_limit,
            fetch_concurrency: cfg.fetch_concurrency.max(1),
            ttl: cfg.cache_ttl(),
            top_n: cfg.top_n,
            min_word_len: cfg.min_word_len,
            stop_words: cfg.stop_word_set(),
        }
    }
}

pub struct RefreshOrchestrator {
    source: Arc<dyn ItemSource>,
    enricher: Arc<ItemEnricher>,
    cache: SnapshotCache,
    settings: Settings,
}

impl RefreshOrchestrator {
    pub fn new(
        source: Arc<dyn ItemSource>,
        enricher: ItemEnricher,
        cache: SnapshotCache,
        settings: Settings,
    ) -> Self {
        Self {
            source,
            enricher: Arc::new(enricher),
            cache,
            settings,
        }
    }

    /// Wire an orchestrator from configuration with the system clock.
    pub fn from_config(source: Arc<dyn ItemSource>, cfg: &InsightsConfig) -> Self {
        Self::new(
            source,
            ItemEnricher::new(&cfg.keywords),
            SnapshotCache::default(),
            Settings::from_config(cfg),
        )
    }

    /// Cached snapshot if still live, otherwise one shared refresh.
    pub async fn get_snapshot(&self) -> SnapshotResult {
        let source = Arc::clone(&self.source);
        let enricher = Arc::clone(&self.enricher);
        let cache = self.cache.clone();
        let limit = self.settings.fetch_limit;
        let concurrency = self.settings.fetch_concurrency;

        self.cache
            .get_or_refresh(TOP_STORIES_KEY, self.settings.ttl, move || async move {
                let raw = ingest::fetch_ranked_items(source.as_ref(), limit, concurrency).await?;
                let items = raw.into_iter().map(|r| enricher.enrich(r)).collect();
                Ok(Snapshot::new(items, cache.now()))
            })
            .await
    }

    pub fn state(&self) -> CacheState {
        self.cache.state(TOP_STORIES_KEY)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    pub fn insights(&self, snapshot: &Snapshot, n: Option<usize>) -> Insights {
        Insights::compute(snapshot, n.unwrap_or(self.settings.top_n))
    }

    /// Trending words with the configured stop words and minimum length.
    pub fn trending(&self, snapshot: &Snapshot, n: Option<usize>) -> Vec<(String, usize)> {
        analytics::trending_words_with(
            snapshot,
            n.unwrap_or(self.settings.top_n),
            &self.settings.stop_words,
            self.settings.min_word_len,
        )
    }
}
