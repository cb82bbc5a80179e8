use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and publish the configured cache TTL.
    pub fn init(ttl_secs: u64) -> anyhow::Result<Self> {
        // Use default buckets to avoid API differences across crate versions.
        let handle = PrometheusBuilder::new().install_recorder()?;

        describe_counter!("snapshot_cache_hits_total", "Snapshot reads served from a live entry.");
        describe_counter!("snapshot_cache_misses_total", "Snapshot reads that started a refresh.");
        describe_counter!(
            "snapshot_cache_joins_total",
            "Snapshot reads that attached to an in-flight refresh."
        );
        describe_counter!("snapshot_refresh_total", "Completed refresh attempts.");
        describe_counter!("snapshot_refresh_errors_total", "Refresh attempts that failed.");
        describe_histogram!("snapshot_refresh_ms", "Refresh duration in milliseconds.");
        describe_gauge!("snapshot_items", "Items in the most recent snapshot.");
        describe_gauge!("snapshot_cache_ttl_secs", "Configured snapshot TTL.");

        // Absolute TTL, no sliding refresh
        gauge!("snapshot_cache_ttl_secs").set(ttl_secs as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
